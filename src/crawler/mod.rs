use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;

use crate::{error::FetchError, util};

/// 食鳥相場 (shokucho.co.jp)
pub mod shokucho;

/// 取得頁面文字內容的來源
///
/// 編碼判斷由實作負責，呼叫端只會拿到已解碼的文字。
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// 以 HTTP GET 取得頁面，只嘗試一次
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        HttpFetcher { timeout }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        util::http::get_page(url, self.timeout).await
    }
}

/// 讀取先前儲存的 HTML 快照，忽略 url
pub struct SnapshotFetcher {
    path: PathBuf,
}

impl SnapshotFetcher {
    pub fn new(path: PathBuf) -> Self {
        SnapshotFetcher { path }
    }
}

#[async_trait]
impl Fetcher for SnapshotFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.clone(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(FetchError::Empty {
                url: self.path.display().to_string(),
            });
        }

        Ok(util::http::decode_body(&bytes, None))
    }
}
