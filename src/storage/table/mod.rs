/// 每日相場
pub mod daily_price;
/// 月平均
pub mod monthly_summary;
