use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::{
    calculation::monthly_summary,
    crawler::{self, Fetcher},
    logging, storage,
    storage::table::daily_price::{self, DailyPrice},
    util::map,
};

/// 一次執行的統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 本次從頁面解析出的筆數
    pub candidates: usize,
    /// 新增到資料集的筆數
    pub appended: usize,
    /// 合併後的總筆數
    pub total: usize,
}

/// 抓取當日相場並更新資料集
///
/// 抓取失敗時直接回傳錯誤，既有的輸出檔不會被改動。
pub async fn execute(
    fetcher: &dyn Fetcher,
    url: &str,
    today: NaiveDate,
    out_dir: &Path,
) -> Result<RunSummary> {
    let extraction = crawler::shokucho::price::visit(fetcher, url, today)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if extraction.tables == 0 {
        logging::warn_file_async(format!("No table found in {}", url));
    }

    let candidates: Vec<DailyPrice> = extraction.rows.iter().map(DailyPrice::from).collect();
    if candidates.is_empty() {
        logging::warn_file_async(format!("No price row parsed from {}", url));
    }

    let existing = storage::load_daily_prices(out_dir);
    let before = map::key_set(&existing).len();

    let merged = daily_price::merge_append(existing, candidates.clone());
    let monthly = monthly_summary::aggregate(&merged);

    storage::write_all(out_dir, &merged, &monthly)
        .with_context(|| format!("Failed to write dataset into {}", out_dir.display()))?;

    let summary = RunSummary {
        candidates: candidates.len(),
        appended: merged.len().saturating_sub(before),
        total: merged.len(),
    };

    logging::info_file_async(format!("{:?}", summary));

    Ok(summary)
}
