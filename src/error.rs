use std::path::PathBuf;

use thiserror::Error;

/// 取得頁面失敗，整個流程會中止且不寫出任何檔案
#[derive(Debug, Error)]
pub enum FetchError {
    /// 伺服器回應非 2xx
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    /// 連線、逾時或讀取 body 失敗
    #[error("failed to request {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 回應內容為空
    #[error("{url} returned an empty body")]
    Empty { url: String },

    /// 快照檔讀取失敗
    #[error("failed to read snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build http client: {0}")]
    Client(String),
}

/// 既有資料集無法讀取，只在 storage 內部處理，視為空資料集
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid dataset: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
