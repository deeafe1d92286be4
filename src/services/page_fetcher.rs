use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT},
    redirect, Client,
};

const MAX_REDIRECTS: usize = 10;

const BROWSER_HEADERS: [(&str, &str); 12] = [
    ("priority", "u=0, i"),
    (
        "sec-ch-ua",
        r#""Chromium";v="128", "Not;A=Brand";v="24", "DuckDuckGo";v="128""#,
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", r#""Windows""#),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-site", "same-origin"),
    ("sec-gpc", "1"),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "en-GB,en;q=0.9,en-US;q=0.8"),
    ("cache-control", "no-cache"),
    ("pragma", "no-cache"),
];

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36 Edg/128.0.0.0";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("failed to read response body: {0}")]
    Body(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub fn browser_header_profile() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Fetches result pages with a browser-like header profile. No cookies are
/// kept between calls.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .default_headers(browser_header_profile())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()?;

        Ok(HttpPageFetcher { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            log::error!("Fetching {} returned status {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        res.text().await.map_err(|e| {
            log::error!("Failed to parse text from html_content. Error: {:?}", e);
            FetchError::Body(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::header::{ACCEPT_ENCODING, USER_AGENT};

    use super::{browser_header_profile, HttpPageFetcher};

    #[test]
    fn header_profile_mimics_a_browser() {
        let headers = browser_header_profile();

        assert!(headers[USER_AGENT].to_str().unwrap().contains("Chrome/128"));
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert_eq!(headers["pragma"], "no-cache");
        // the client negotiates compression on its own
        assert!(headers.get(ACCEPT_ENCODING).is_none());
    }

    #[test]
    fn fetcher_builds_with_timeout() {
        assert!(HttpPageFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
