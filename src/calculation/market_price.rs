use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;

use crate::declare::Category;

/// 加權平均後的換算係數
const SCALE: Decimal = dec!(0.32);
/// 取引價 = 相場價 + 10
const TRANSACTION_MARGIN: i64 = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MarketPrice {
    /// 相場價
    pub market_price: i64,
    /// 取引價
    pub transaction_price: i64,
}

/// Derives the market and transaction prices from the two average prices.
///
/// `market = (momo_avg * 0.55 + mune_avg * 0.45) * 0.32`, evaluated in exact
/// decimal arithmetic and floored. The inputs come from the extractor, which
/// only accepts values that fit in an `i64`.
pub fn compute(momo_avg: Decimal, mune_avg: Decimal) -> MarketPrice {
    let market =
        (momo_avg * Category::Momo.weight() + mune_avg * Category::Mune.weight()) * SCALE;
    let market_price = floor_to_i64(market).unwrap_or_default();

    MarketPrice {
        market_price,
        transaction_price: market_price + TRANSACTION_MARGIN,
    }
}

/// 無條件捨去後轉為 i64，超出範圍時回傳 None
pub fn floor_to_i64(value: Decimal) -> Option<i64> {
    value.floor().to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_exact() {
        assert_eq!(
            compute(dec!(100), dec!(100)),
            MarketPrice {
                market_price: 32,
                transaction_price: 42
            }
        );
    }

    #[test]
    fn test_compute_floors() {
        // (650 * 0.55 + 480 * 0.45) * 0.32 = (357.5 + 216) * 0.32 = 183.52
        let mp = compute(dec!(650), dec!(480));
        assert_eq!(mp.market_price, 183);
        assert_eq!(mp.transaction_price, 193);
    }

    #[test]
    fn test_compute_without_float_drift() {
        // (500 * 0.55 + 500 * 0.45) * 0.32 = 160 exactly
        assert_eq!(compute(dec!(500), dec!(500)).market_price, 160);
    }

    #[test]
    fn test_floor_to_i64() {
        assert_eq!(floor_to_i64(dec!(12.9)), Some(12));
        assert_eq!(floor_to_i64(dec!(-0.5)), Some(-1));
        assert_eq!(floor_to_i64(Decimal::MAX), None);
    }
}
