use chrono::{Datelike, FixedOffset, Local, NaiveDate, Utc};

use crate::logging;

/// 資料集內日期的固定格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Infers the calendar year of a table that only shows its month.
///
/// `month0` is the 0-based month printed on the page. When it lies more than
/// one month ahead of `today`, the page is still showing last year's table
/// (a December table seen in early January), so the previous year is used.
///
/// # Example
///
/// ```
/// let today = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
/// assert_eq!(infer_year(10, today), 2024);
/// assert_eq!(infer_year(0, today), 2025);
/// ```
pub fn infer_year(month0: u32, today: NaiveDate) -> i32 {
    if month0 > today.month0() + 1 {
        today.year() - 1
    } else {
        today.year()
    }
}

/// 取得指定時區 (UTC 偏移小時) 的今天日期，偏移不合法時改用本機時區
pub fn today_in(utc_offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
        None => {
            logging::warn_file_async(format!(
                "Invalid utc offset {} hours, using local time instead",
                utc_offset_hours
            ));
            Local::now().date_naive()
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// 從 `YYYY-MM-DD` 取出 (年, 月)
pub fn parse_year_month(date: &str) -> Option<(i32, u32)> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .ok()
        .map(|d| (d.year(), d.month()))
}
