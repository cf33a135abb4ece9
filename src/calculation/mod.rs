/// 相場價與取引價
pub mod market_price;
/// 月平均相場價
pub mod monthly_summary;
