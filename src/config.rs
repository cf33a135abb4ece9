use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{crawler::shokucho, logging};

const CONFIG_PATH: &str = "app.json";

/// 相場表頁面
const DEFAULT_SOURCE_PAGE: &str = "original4.html";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// 資料來源網站所在地 (JST)
const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
const DEFAULT_OUTPUT_DIR: &str = "docs/data";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub output: Output,
}

const SOURCE_URL: &str = "SOURCE_URL";
const SOURCE_SNAPSHOT_FILE: &str = "SOURCE_SNAPSHOT_FILE";
const SOURCE_TIMEOUT_SECS: &str = "SOURCE_TIMEOUT_SECS";
const SOURCE_UTC_OFFSET_HOURS: &str = "SOURCE_UTC_OFFSET_HOURS";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Source {
    #[serde(default = "default_url")]
    pub url: String,
    /// 指定時改讀本機儲存的 HTML 快照，不連網
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 判斷「今天」使用的時區
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for Source {
    fn default() -> Self {
        Source {
            url: default_url(),
            snapshot_file: None,
            timeout_secs: default_timeout_secs(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl Source {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const OUTPUT_DIR: &str = "OUTPUT_DIR";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Output {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            dir: default_output_dir(),
        }
    }
}

fn default_url() -> String {
    format!("https://{}/{}", shokucho::HOST, DEFAULT_SOURCE_PAGE)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_utc_offset_hours() -> i32 {
    DEFAULT_UTC_OFFSET_HOURS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| {
    App::get().unwrap_or_else(|why| {
        logging::error_file_async(format!(
            "I can't read the config context because {:?}",
            why
        ));
        App::default().override_with_env()
    })
});

impl App {
    fn get() -> Result<Self> {
        Self::load(config_path())
    }

    /// 讀取設定檔 (不存在時使用預設值) 後再以環境變數覆蓋
    fn load(config_path: PathBuf) -> Result<Self> {
        if !config_path.exists() {
            return Ok(App::default().override_with_env());
        }

        let config: App = config_config::builder()
            .add_source(config_file::from(config_path))
            .build()?
            .try_deserialize()?;

        Ok(config.override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(url) = env::var(SOURCE_URL) {
            if !url.is_empty() {
                self.source.url = url;
            }
        }

        if let Ok(file) = env::var(SOURCE_SNAPSHOT_FILE) {
            self.source.snapshot_file = if file.is_empty() {
                None
            } else {
                Some(PathBuf::from(file))
            };
        }

        if let Ok(secs) = env::var(SOURCE_TIMEOUT_SECS) {
            self.source.timeout_secs = u64::from_str(&secs).unwrap_or(DEFAULT_TIMEOUT_SECS);
        }

        if let Ok(offset) = env::var(SOURCE_UTC_OFFSET_HOURS) {
            self.source.utc_offset_hours =
                i32::from_str(&offset).unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
        }

        if let Ok(dir) = env::var(OUTPUT_DIR) {
            if !dir.is_empty() {
                self.output.dir = PathBuf::from(dir);
            }
        }

        self
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
