use serde::{Deserialize, Serialize};

/// 月平均相場價
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    /// floor(當月相場價平均)
    pub market_price_avg: i64,
}

impl MonthlySummary {
    pub fn new(year: i32, month: u32, market_price_avg: i64) -> Self {
        MonthlySummary {
            year,
            month,
            market_price_avg,
        }
    }
}
