use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    error::StoreError,
    logging,
    storage::table::{daily_price::DailyPrice, monthly_summary::MonthlySummary},
};

pub mod table;

pub const DAILY_JSON: &str = "daily.json";
pub const DAILY_CSV: &str = "daily.csv";
pub const MONTHLY_SUMMARY_JSON: &str = "monthly-summary.json";

/// Loads the previously persisted daily dataset from `dir`.
///
/// A missing file is a first run and yields an empty dataset. A file that
/// cannot be read or parsed is logged as a warning and also treated as empty,
/// so a damaged dataset never stops the run.
pub fn load_daily_prices(dir: &Path) -> Vec<DailyPrice> {
    let path = dir.join(DAILY_JSON);

    match read_daily_prices(&path) {
        Ok(records) => records,
        Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            logging::info_file_async(format!("{} not found, starting fresh", path.display()));
            Vec::new()
        }
        Err(why) => {
            logging::warn_file_async(format!(
                "Failed to load the prior dataset, treating it as empty because {}",
                why
            ));
            Vec::new()
        }
    }
}

fn read_daily_prices(path: &Path) -> Result<Vec<DailyPrice>, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// 將資料集完整覆寫到輸出目錄
pub fn write_all(dir: &Path, daily: &[DailyPrice], monthly: &[MonthlySummary]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    write_atomic(&dir.join(DAILY_JSON), &to_pretty_json(daily)?)?;
    write_atomic(&dir.join(DAILY_CSV), &to_csv(daily)?)?;
    write_atomic(&dir.join(MONTHLY_SUMMARY_JSON), &to_pretty_json(monthly)?)?;

    logging::info_file_async(format!(
        "wrote {} daily rows and {} monthly rows into {}",
        daily.len(),
        monthly.len(),
        dir.display()
    ));

    Ok(())
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');
    Ok(json)
}

fn to_csv(daily: &[DailyPrice]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    // 資料為空時仍要輸出標題列
    wtr.write_record(DailyPrice::FIELDS)?;
    for record in daily {
        wtr.serialize(record)?;
    }

    wtr.into_inner()
        .map_err(|why| anyhow::anyhow!("Failed to finish csv because {}", why.error()))
}

/// 先寫入同目錄的暫存檔再改名，寫到一半失敗不會破壞原檔
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = temp_path(path);

    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp.display(),
            path.display()
        )
    })?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, mune_vol: Option<i64>) -> DailyPrice {
        DailyPrice {
            date: date.to_string(),
            weekday: "木".to_string(),
            momo_low: 600,
            momo_avg: 650,
            momo_high: 700,
            momo_vol: Some(1200),
            mune_low: 300,
            mune_avg: 480,
            mune_high: 500,
            mune_vol,
            market_price: 183,
            transaction_price: 193,
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_daily_prices(dir.path()).is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DAILY_JSON), "{ broken").unwrap();

        assert!(load_daily_prices(dir.path()).is_empty());
        assert!(matches!(
            read_daily_prices(&dir.path().join(DAILY_JSON)),
            Err(StoreError::Malformed { .. })
        ));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("docs").join("data");
        let daily = vec![record("2025-01-02", None), record("2025-01-03", Some(900))];
        let monthly = vec![MonthlySummary::new(2025, 1, 183)];

        write_all(&out, &daily, &monthly).unwrap();

        assert_eq!(load_daily_prices(&out), daily);

        let summary: Vec<MonthlySummary> =
            serde_json::from_str(&fs::read_to_string(out.join(MONTHLY_SUMMARY_JSON)).unwrap())
                .unwrap();
        assert_eq!(summary, monthly);

        let entries: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries.len(), 3, "{:?}", entries);
    }

    #[test]
    fn test_csv_layout() {
        let csv = String::from_utf8(to_csv(&[record("2025-01-02", None)]).unwrap()).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], DailyPrice::FIELDS.join(","));
        assert_eq!(lines[1], "2025-01-02,木,600,650,700,1200,300,480,500,,183,193");
        assert_eq!(lines[2], "");
    }

    #[test]
    fn test_csv_header_only() {
        let csv = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv, format!("{}\r\n", DailyPrice::FIELDS.join(",")));
    }
}
