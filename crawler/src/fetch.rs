use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("not an HTML page ({content_type}): {url}")]
    NotHtml { url: String, content_type: String },

    #[error("body too large: {url}")]
    TooLarge { url: String },

    #[error("request failed for {url}: {source}")]
    Request { url: String, source: reqwest::Error },
}

impl FetchError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else {
            FetchError::Request { url: url.to_string(), source: e }
        }
    }
}

/// Single-GET page fetcher. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Raw page markup. Parsing happens in the caller because the parsed tree
    /// cannot cross await points.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status });
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
            if let Ok(v) = ct.to_str() {
                if !v.starts_with("text/html") {
                    return Err(FetchError::NotHtml { url: url.to_string(), content_type: v.to_string() });
                }
            }
        }
        if resp.content_length().is_some_and(|n| n > MAX_BODY_BYTES as u64) {
            return Err(FetchError::TooLarge { url: url.to_string() });
        }
        // Decoded with the charset named in Content-Type, UTF-8 otherwise.
        let body = resp.text().await.map_err(|e| FetchError::from_reqwest(url, e))?;
        if body.len() > MAX_BODY_BYTES {
            return Err(FetchError::TooLarge { url: url.to_string() });
        }
        Ok(body)
    }
}
