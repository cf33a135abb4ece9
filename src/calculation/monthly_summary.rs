use std::collections::BTreeMap;

use crate::{
    storage::table::{daily_price::DailyPrice, monthly_summary::MonthlySummary},
    util::datetime,
};

/// Groups the records by the year and month of their date and averages the
/// market price of each group, rounding down.
///
/// The output is ordered by year, then month. Records whose date cannot be
/// parsed are left out.
pub fn aggregate(records: &[DailyPrice]) -> Vec<MonthlySummary> {
    let mut groups: BTreeMap<(i32, u32), (i128, i128)> = BTreeMap::new();

    for record in records {
        let Some(key) = datetime::parse_year_month(&record.date) else {
            continue;
        };

        let (sum, count) = groups.entry(key).or_insert((0, 0));
        *sum += i128::from(record.market_price);
        *count += 1;
    }

    groups
        .into_iter()
        .map(|((year, month), (sum, count))| {
            let avg = sum.div_euclid(count);
            MonthlySummary::new(year, month, i64::try_from(avg).unwrap_or_default())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, market_price: i64) -> DailyPrice {
        DailyPrice {
            date: date.to_string(),
            weekday: "月".to_string(),
            momo_low: 0,
            momo_avg: 0,
            momo_high: 0,
            momo_vol: None,
            mune_low: 0,
            mune_avg: 0,
            mune_high: 0,
            mune_vol: None,
            market_price,
            transaction_price: market_price + 10,
        }
    }

    #[test]
    fn test_aggregate_floor_mean() {
        let summaries = aggregate(&[
            record("2025-01-02", 10),
            record("2025-01-03", 20),
            record("2025-01-04", 30),
            record("2025-02-01", 10),
            record("2025-02-03", 21),
        ]);

        assert_eq!(
            summaries,
            vec![
                MonthlySummary::new(2025, 1, 20),
                MonthlySummary::new(2025, 2, 15),
            ]
        );
    }

    #[test]
    fn test_aggregate_ordering_across_years() {
        let summaries = aggregate(&[
            record("2025-01-02", 100),
            record("2024-12-28", 90),
            record("2024-02-01", 80),
        ]);

        let keys: Vec<(i32, u32)> = summaries.iter().map(|s| (s.year, s.month)).collect();
        assert_eq!(keys, vec![(2024, 2), (2024, 12), (2025, 1)]);
    }

    #[test]
    fn test_aggregate_skips_unparseable_date() {
        let summaries = aggregate(&[record("not-a-date", 10), record("2025-01-02", 30)]);
        assert_eq!(summaries, vec![MonthlySummary::new(2025, 1, 30)]);
    }

    #[test]
    fn test_aggregate_negative_floor() {
        // floor(-1.5) = -2
        let summaries = aggregate(&[record("2025-01-02", -1), record("2025-01-03", -2)]);
        assert_eq!(summaries[0].market_price_avg, -2);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }
}
