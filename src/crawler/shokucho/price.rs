use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use crate::{
    calculation::market_price,
    crawler::Fetcher,
    declare::DayOfWeek,
    error::FetchError,
    logging,
    util::{self, number, text},
};

/// 少於這個欄位數的列不是資料列
const MIN_CELLS: usize = 3;
/// 兩個部位各至少要有 低/平均/高 三個數字
const MIN_NUMBERS: usize = 6;
/// 只取列尾的數字：兩個部位各 低/平均/高/量
const TAIL_NUMBERS: usize = 8;

lazy_static! {
    static ref TABLE_SELECTOR: Selector = Selector::parse("table").unwrap();
    static ref ROW_SELECTOR: Selector = Selector::parse("tr").unwrap();
    static ref CELL_SELECTOR: Selector = Selector::parse("td, th").unwrap();
    static ref MONTH_RE: Regex = Regex::new(r"([0-9０-９]{1,2})\s*月").unwrap();
    static ref DAY_RE: Regex = Regex::new(r"^([0-9]{1,2})日$").unwrap();
}

/// 單一部位的一日行情
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryQuote {
    pub low: Decimal,
    pub avg: Decimal,
    pub high: Decimal,
    /// 量，頁面不一定有
    pub volume: Option<Decimal>,
}

impl CategoryQuote {
    /// `[low, avg, high, volume?]`，多出的數字忽略
    fn from_slice(values: &[Decimal]) -> Option<Self> {
        let (low, avg, high) = match values {
            [low, avg, high, ..] => (*low, *avg, *high),
            _ => return None,
        };

        // 無法轉成整數的值視同無效
        for v in [low, avg, high] {
            market_price::floor_to_i64(v)?;
        }

        let volume = values
            .get(3)
            .copied()
            .filter(|v| market_price::floor_to_i64(*v).is_some());

        Some(CategoryQuote {
            low,
            avg,
            high,
            volume,
        })
    }
}

/// 相場表中通過檢查的一列，尚未計算相場價
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub weekday: DayOfWeek,
    pub momo: CategoryQuote,
    pub mune: CategoryQuote,
}

/// 一次解析的結果
#[derive(Debug, Default)]
pub struct Extraction {
    /// 頁面上 `<table>` 的數量
    pub tables: usize,
    pub rows: Vec<PriceRow>,
}

/// 抓取頁面並解析出每日行情
pub async fn visit(
    fetcher: &dyn Fetcher,
    url: &str,
    today: NaiveDate,
) -> Result<Extraction, FetchError> {
    let html = fetcher.fetch(url).await?;
    logging::info_file_async(format!("fetch: ok, html length = {}", html.len()));

    let extraction = parse_document(&html, today);
    logging::info_file_async(format!(
        "tables found: {}, rows parsed: {}",
        extraction.tables,
        extraction.rows.len()
    ));

    Ok(extraction)
}

/// Extracts every accepted price row from every table of the page.
///
/// Tables without a month caption are skipped. Rows that fail the acceptance
/// checks (headers, spacers, the closed market day, rows with too few
/// numbers, days after `today`) are dropped silently.
pub fn parse_document(html: &str, today: NaiveDate) -> Extraction {
    let document = Html::parse_document(html);
    let mut extraction = Extraction::default();

    for table in document.select(&TABLE_SELECTOR) {
        extraction.tables += 1;

        let Some(month0) = table_month0(&table) else {
            continue;
        };

        let year = util::datetime::infer_year(month0, today);
        extraction.rows.extend(
            table
                .select(&ROW_SELECTOR)
                .filter_map(|tr| parse_row(tr, year, month0 + 1, today)),
        );
    }

    extraction
}

/// 表格文字中第一個「N月」，回傳 0 起算的月份
fn table_month0(table: &ElementRef) -> Option<u32> {
    let table_text = table.text().collect::<String>();
    let caps = MONTH_RE.captures(&table_text)?;
    let month = text::to_half_width(caps.get(1)?.as_str())
        .parse::<u32>()
        .ok()?;

    if !(1..=12).contains(&month) {
        logging::debug_file_async(format!("Skip table with invalid month {}", month));
        return None;
    }

    Some(month - 1)
}

fn parse_row(tr: ElementRef, year: i32, month: u32, today: NaiveDate) -> Option<PriceRow> {
    let cells: Vec<String> = tr
        .select(&CELL_SELECTOR)
        .map(|td| text::sanitize_cell(&td.inner_html()))
        .collect();

    if cells.len() < MIN_CELLS {
        return None;
    }

    let day_text = text::to_half_width(&cells[0]);
    let day = DAY_RE.captures(&day_text)?.get(1)?.as_str().parse::<u32>().ok()?;

    let weekday = DayOfWeek::from_symbol(&cells[1])?;
    if weekday.is_closed_market_day() {
        return None;
    }

    let numbers = number::extract_numbers(&cells[2..].join(" "));
    let (momo, mune) = split_quotes(&numbers)?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    if date > today {
        return None;
    }

    Some(PriceRow {
        date,
        weekday,
        momo,
        mune,
    })
}

/// Assigns the trailing numbers of a row to the two categories.
///
/// The last (up to) eight numbers are split in half: the first half is
/// `[low, avg, high, volume?]` for momo, the second half the same for mune.
/// This works whether the page prints one combined cell or one cell per
/// category, and ignores any leading numbers such as day-over-day changes.
pub fn split_quotes(numbers: &[Decimal]) -> Option<(CategoryQuote, CategoryQuote)> {
    if numbers.len() < MIN_NUMBERS {
        return None;
    }

    let tail = &numbers[numbers.len().saturating_sub(TAIL_NUMBERS)..];
    let (momo, mune) = tail.split_at(tail.len() / 2);

    Some((
        CategoryQuote::from_slice(momo)?,
        CategoryQuote::from_slice(mune)?,
    ))
}
