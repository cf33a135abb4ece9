use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeDelta};

use crate::logging;

/// 預設單檔最大大小：10 MB
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// 依日期切檔，同一天超過大小上限時以世代編號 (.1, .2 ...) 續寫
pub struct Rotate {
    /// 檔名模式，例如 "log/default_%Y-%m-%d.log"
    fn_pattern: String,
    /// 當前基礎檔名（不含 generation，由日期決定）
    cur_base_fn: String,
    out_fh: Option<BufWriter<File>>,
    /// 當前世代編號，只增不減
    generation: u32,
    max_size: u64,
    current_size: u64,
    max_age: TimeDelta,
}

impl Rotate {
    pub fn new(fn_pattern: String) -> Self {
        Self::with_options(fn_pattern, DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_options(fn_pattern: String, max_size: u64, max_age_days: i64) -> Self {
        Rotate {
            fn_pattern,
            cur_base_fn: String::new(),
            out_fh: None,
            generation: 0,
            max_size,
            current_size: 0,
            max_age: TimeDelta::try_days(max_age_days).unwrap_or(TimeDelta::days(7)),
        }
    }

    /// 寫入日誌訊息，自動處理換日與大小輪轉
    pub fn write_msg(&mut self, now: DateTime<Local>, msg: &[u8]) -> Result<()> {
        let base_fn = now.format(&self.fn_pattern).to_string();

        // 日期變更：重設 generation
        if base_fn != self.cur_base_fn || self.out_fh.is_none() {
            self.generation = 0;
            self.cur_base_fn = base_fn;
            self.open_new_file()?;
            self.cleanup_old_files(now);
        }

        if self.current_size > 0 && self.current_size + msg.len() as u64 > self.max_size {
            self.generation += 1;
            self.open_new_file()?;
        }

        let writer = self
            .out_fh
            .as_mut()
            .ok_or_else(|| anyhow!("log file {} is not open", self.cur_base_fn))?;
        writer.write_all(msg)?;
        self.current_size += msg.len() as u64;

        Ok(())
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.out_fh.as_mut() {
            let _ = writer.flush();
        }
    }

    /// generation = 0: "log/default_2025-02-03.log"
    /// generation = 1: "log/default_2025-02-03.1.log"
    fn generate_full_fn(&self, generation: u32) -> PathBuf {
        let path = Path::new(&self.cur_base_fn);
        if generation == 0 {
            return path.to_path_buf();
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("log");
        parent.join(format!("{}.{}.{}", stem, generation, ext))
    }

    fn open_new_file(&mut self) -> Result<()> {
        self.flush();

        let filename = self.generate_full_fn(self.generation);
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.out_fh = Some(BufWriter::with_capacity(4096, file));

        Ok(())
    }

    /// 刪除同目錄下修改時間超過 max_age 的 .log 檔
    fn cleanup_old_files(&self, now: DateTime<Local>) {
        let dir = match Path::new(&self.cur_base_fn).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(why) => {
                logging::error_console(format!(
                    "Failed to read log directory {} because {:?}",
                    dir.display(),
                    why
                ));
                return;
            }
        };

        let cut_off = (now - self.max_age).timestamp().max(0) as u64;
        for path in entries.flatten().map(|e| e.path()) {
            if path.extension().and_then(|s| s.to_str()) != Some("log") {
                continue;
            }

            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok());

            if matches!(modified, Some(d) if d.as_secs() <= cut_off) {
                if let Err(why) = fs::remove_file(&path) {
                    logging::error_console(format!(
                        "couldn't remove the file({}). because {:?}",
                        path.display(),
                        why
                    ));
                }
            }
        }
    }
}

impl Drop for Rotate {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_in(dir: &Path, name: &str) -> String {
        dir.join(format!("{}_%Y-%m-%d.log", name))
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn test_basic_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Rotate::new(pattern_in(dir.path(), "basic"));
        let now = Local::now();

        r.write_msg(now, b"hello\r\n").unwrap();
        r.flush();

        let file = dir
            .path()
            .join(format!("basic_{}.log", now.format("%Y-%m-%d")));
        assert_eq!(fs::read_to_string(file).unwrap(), "hello\r\n");
    }

    #[test]
    fn test_size_rotation_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Rotate::with_options(pattern_in(dir.path(), "size"), 64, 7);
        let now = Local::now();

        for i in 0..10 {
            let msg = format!("Line {:03} - {}\r\n", i, "X".repeat(20));
            r.write_msg(now, msg.as_bytes()).unwrap();
        }
        r.flush();

        assert!(r.generation >= 3, "generation = {}", r.generation);
        let files = fs::read_dir(dir.path()).unwrap().count() as u32;
        assert_eq!(files, r.generation + 1);
    }

    #[test]
    fn test_date_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Rotate::new(pattern_in(dir.path(), "date"));
        let mut now = Local::now();

        r.write_msg(now, b"day 1\r\n").unwrap();
        now += TimeDelta::try_days(1).unwrap();
        r.write_msg(now, b"day 2\r\n").unwrap();
        r.flush();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(r.generation, 0);
    }

    #[test]
    fn test_generation_filename() {
        let mut r = Rotate::new("log/app_%Y-%m-%d.log".to_string());
        r.cur_base_fn = "log/app_2025-02-03.log".to_string();

        assert_eq!(r.generate_full_fn(0), PathBuf::from("log/app_2025-02-03.log"));
        assert_eq!(r.generate_full_fn(2), PathBuf::from("log/app_2025-02-03.2.log"));
    }
}
