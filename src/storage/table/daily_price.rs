use hashbrown::HashSet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    calculation::market_price::{self, MarketPrice},
    crawler::shokucho::price::PriceRow,
    util::{datetime, map::Keyable},
};

/// 每日雞肉相場
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DailyPrice {
    /// YYYY-MM-DD
    pub date: String,
    /// 星期 (月火水木金土日)
    pub weekday: String,
    pub momo_low: i64,
    pub momo_avg: i64,
    pub momo_high: i64,
    #[serde(default, with = "volume")]
    pub momo_vol: Option<i64>,
    pub mune_low: i64,
    pub mune_avg: i64,
    pub mune_high: i64,
    #[serde(default, with = "volume")]
    pub mune_vol: Option<i64>,
    /// 相場價
    pub market_price: i64,
    /// 取引價
    pub transaction_price: i64,
}

impl DailyPrice {
    /// CSV 的欄位名稱，順序與結構欄位一致
    pub const FIELDS: [&'static str; 12] = [
        "date",
        "weekday",
        "momo_low",
        "momo_avg",
        "momo_high",
        "momo_vol",
        "mune_low",
        "mune_avg",
        "mune_high",
        "mune_vol",
        "market_price",
        "transaction_price",
    ];
}

impl From<&PriceRow> for DailyPrice {
    fn from(row: &PriceRow) -> Self {
        let prices: MarketPrice = market_price::compute(row.momo.avg, row.mune.avg);

        DailyPrice {
            date: datetime::format_date(row.date),
            weekday: row.weekday.to_string(),
            momo_low: floor(row.momo.low),
            momo_avg: floor(row.momo.avg),
            momo_high: floor(row.momo.high),
            momo_vol: row.momo.volume.and_then(market_price::floor_to_i64),
            mune_low: floor(row.mune.low),
            mune_avg: floor(row.mune.avg),
            mune_high: floor(row.mune.high),
            mune_vol: row.mune.volume.and_then(market_price::floor_to_i64),
            market_price: prices.market_price,
            transaction_price: prices.transaction_price,
        }
    }
}

/// The extractor only emits values that fit in an `i64`.
fn floor(value: Decimal) -> i64 {
    market_price::floor_to_i64(value).unwrap_or_default()
}

impl Keyable for DailyPrice {
    fn key(&self) -> String {
        self.date.clone()
    }
}

/// Merges newly scraped records into the existing dataset.
///
/// Every existing record is kept as is; an incoming record is appended only
/// when its date is not present yet, so the first record seen for a date
/// wins. The result is sorted ascending by date and has unique dates, which
/// makes the merge idempotent: `merge_append(merge_append(e, i), i)` equals
/// `merge_append(e, i)`.
pub fn merge_append(existing: Vec<DailyPrice>, incoming: Vec<DailyPrice>) -> Vec<DailyPrice> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut merged: Vec<DailyPrice> = existing
        .into_iter()
        .chain(incoming)
        .filter(|record| seen.insert(record.key()))
        .collect();

    // YYYY-MM-DD 的字典序即日期順序
    merged.sort_by(|a, b| a.date.cmp(&b.date));

    merged
}

/// 量欄位：缺值寫成 `""`，讀取時接受數字、數字字串、`""` 與 null
mod volume {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::calculation::market_price;

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_i64(*v),
            None => serializer.serialize_str(""),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;

        Ok(match raw {
            None => None,
            Some(Raw::Integer(v)) => Some(v),
            Some(Raw::Float(v)) => Decimal::try_from(v)
                .ok()
                .and_then(market_price::floor_to_i64),
            Some(Raw::Text(s)) => s
                .trim()
                .replace(',', "")
                .parse::<Decimal>()
                .ok()
                .and_then(market_price::floor_to_i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{crawler::shokucho::price::CategoryQuote, declare::DayOfWeek, util::map};

    fn record(date: &str, market_price: i64) -> DailyPrice {
        DailyPrice {
            date: date.to_string(),
            weekday: "月".to_string(),
            momo_low: 600,
            momo_avg: 650,
            momo_high: 700,
            momo_vol: Some(1200),
            mune_low: 300,
            mune_avg: 320,
            mune_high: 340,
            mune_vol: None,
            market_price,
            transaction_price: market_price + 10,
        }
    }

    #[test]
    fn test_from_price_row() {
        let row = PriceRow {
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            weekday: DayOfWeek::Thursday,
            momo: CategoryQuote {
                low: dec!(600.5),
                avg: dec!(650),
                high: dec!(700),
                volume: Some(dec!(1200.9)),
            },
            mune: CategoryQuote {
                low: dec!(300),
                avg: dec!(480),
                high: dec!(500),
                volume: None,
            },
        };

        let daily = DailyPrice::from(&row);
        assert_eq!(daily.date, "2025-01-02");
        assert_eq!(daily.weekday, "木");
        assert_eq!(daily.momo_low, 600);
        assert_eq!(daily.momo_vol, Some(1200));
        assert_eq!(daily.mune_vol, None);
        // (650 * 0.55 + 480 * 0.45) * 0.32 = 183.52
        assert_eq!(daily.market_price, 183);
        assert_eq!(daily.transaction_price, 193);
    }

    #[test]
    fn test_merge_append_keeps_existing() {
        let existing = vec![record("2025-01-02", 100)];
        let incoming = vec![record("2025-01-02", 999), record("2025-01-01", 50)];

        let merged = merge_append(existing, incoming);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].date, "2025-01-01");
        assert_eq!(merged[1].market_price, 100);
    }

    #[test]
    fn test_merge_append_idempotent() {
        let existing = vec![record("2024-12-28", 180), record("2025-01-03", 181)];
        let incoming = vec![
            record("2025-01-04", 182),
            record("2025-01-02", 183),
            record("2025-01-04", 184),
        ];

        let once = merge_append(existing, incoming.clone());
        let twice = merge_append(once.clone(), incoming);
        assert_eq!(once, twice);

        let dates: Vec<&str> = once.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["2024-12-28", "2025-01-02", "2025-01-03", "2025-01-04"]
        );
        assert_eq!(once[3].market_price, 182);
        assert_eq!(map::key_set(&once).len(), once.len());
    }

    #[test]
    fn test_merge_append_empty() {
        assert!(merge_append(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_volume_serialize() {
        let json = serde_json::to_value(record("2025-01-02", 100)).unwrap();
        assert_eq!(json["momo_vol"], serde_json::json!(1200));
        assert_eq!(json["mune_vol"], serde_json::json!(""));
    }

    #[test]
    fn test_volume_deserialize_lenient() {
        let json = r#"[
            {"date":"2025-01-02","weekday":"木","momo_low":1,"momo_avg":2,"momo_high":3,"momo_vol":"1,200",
             "mune_low":1,"mune_avg":2,"mune_high":3,"mune_vol":"","market_price":0,"transaction_price":10},
            {"date":"2025-01-03","weekday":"金","momo_low":1,"momo_avg":2,"momo_high":3,"momo_vol":null,
             "mune_low":1,"mune_avg":2,"mune_high":3,"mune_vol":15.7,"market_price":0,"transaction_price":10},
            {"date":"2025-01-04","weekday":"土","momo_low":1,"momo_avg":2,"momo_high":3,
             "mune_low":1,"mune_avg":2,"mune_high":3,"mune_vol":8,"market_price":0,"transaction_price":10}
        ]"#;

        let records: Vec<DailyPrice> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].momo_vol, Some(1200));
        assert_eq!(records[0].mune_vol, None);
        assert_eq!(records[1].momo_vol, None);
        assert_eq!(records[1].mune_vol, Some(15));
        assert_eq!(records[2].momo_vol, None);
        assert_eq!(records[2].mune_vol, Some(8));
    }
}
