/// 每日雞肉相場的採集與資料集更新
pub mod daily_price;
