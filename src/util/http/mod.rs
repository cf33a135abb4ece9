use std::time::{Duration, Instant};

use encoding_rs::{Encoding, UTF_8};
use lazy_static::lazy_static;
use once_cell::sync::{Lazy, OnceCell};
use regex::bytes::Regex;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client,
};

use crate::{error::FetchError, logging::Logger};

pub mod user_agent;

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// 只在文件開頭找 `<meta charset>`
const META_SNIFF_LEN: usize = 2048;

lazy_static! {
    static ref META_CHARSET_RE: Regex =
        Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#).unwrap();
}

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
fn get_client() -> Result<&'static Client, FetchError> {
    CLIENT.get_or_try_init(|| {
        // reqwest 使用 rustls-no-provider，需要先安裝 crypto provider；已安裝時會回傳 Err，忽略即可
        let _ = rustls::crypto::ring::default_provider().install_default();

        Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Duration::from_secs(60))
            // ===== Cookie 和重定向 =====
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            // ===== Headers =====
            .user_agent(user_agent::gen_random_ua())
            .default_headers(browser_headers())
            .build()
            .map_err(|e| FetchError::Client(format!("{:?}", e)))
    })
}

/// 模擬一般瀏覽器的請求標頭，避免被目標網站以 403 拒絕
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.9"));
    headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers
}

/// Performs a single HTTP GET request and returns the decoded page text.
///
/// There is no retry: a non-2xx status, a transport error or an empty body is
/// returned as a `FetchError`. The body is decoded with the charset found in
/// the `Content-Type` header or, failing that, in the document's `<meta>` tag.
pub async fn get_page(url: &str, timeout: Duration) -> Result<String, FetchError> {
    let client = get_client()?;
    let start = Instant::now();
    let res = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|source| {
            LOGGER.error(format!("GET:{} failed because {:?}", url, source));
            FetchError::Network {
                url: url.to_string(),
                source,
            }
        })?;

    let status = res.status();
    LOGGER.info(format!(
        "GET:{} {} {} ms",
        url,
        status,
        start.elapsed().as_millis()
    ));

    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = res.bytes().await.map_err(|source| FetchError::Network {
        url: url.to_string(),
        source,
    })?;

    if bytes.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_string(),
        });
    }

    Ok(decode_body(&bytes, content_type.as_deref()))
}

/// Decodes raw page bytes into text.
///
/// Charset priority: byte order mark, `Content-Type` header, `<meta>` tag in
/// the first bytes of the document, then UTF-8. Undecodable sequences become
/// U+FFFD rather than failing.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes))
        .unwrap_or(UTF_8);

    // decode 會先依 BOM 判斷編碼
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LEN)];
    META_CHARSET_RE
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}
