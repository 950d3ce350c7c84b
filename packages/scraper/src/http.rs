//! HTTP transport behind the [`Fetcher`] seam.
//!
//! The pipeline only ever talks to a `Fetcher`; production code uses the
//! blocking [`HttpFetcher`] below, tests substitute an in-memory one over
//! static fixtures.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{Result, ScrapeError};

/// User agent string identifying this scraper.
const USER_AGENT: &str = concat!("legistar-scraper/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// The pipeline's view of the network.
pub trait Fetcher {
    /// GET a page and return its body as text.
    fn get(&self, url: &str) -> Result<String>;

    /// POST url-encoded form fields and return the response body.
    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String>;

    /// HEAD a link and return its content type, without parameters.
    ///
    /// Returns `Ok(None)` when the response carries no usable content
    /// type, including 4xx responses for dead attachment links.
    fn head_content_type(&self, url: &str) -> Result<Option<String>>;
}

/// Blocking HTTP fetcher with retry on transient failures.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a configured client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Send a request with retry logic.
    ///
    /// Uses exponential backoff for transient failures (network errors,
    /// 5xx responses). Client errors (4xx) are not retried.
    fn send_with_retry(
        &self,
        url: &str,
        send: impl Fn() -> reqwest::Result<Response>,
    ) -> Result<Response> {
        let mut last_error: Option<String> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1000ms, 2000ms
                let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
                tracing::debug!(attempt, delay_ms = delay, "Retrying after delay");
                thread::sleep(Duration::from_millis(delay));
            }

            match send() {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() {
                        tracing::warn!(
                            status = %status,
                            attempt = attempt + 1,
                            max_retries = MAX_RETRIES,
                            "Server error, will retry"
                        );
                        last_error = Some(format!("Server error: {status}"));
                        continue;
                    }

                    // Client errors (4xx) won't succeed on retry
                    return Ok(response.error_for_status()?);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        tracing::warn!(
                            error = %e,
                            attempt = attempt + 1,
                            max_retries = MAX_RETRIES,
                            "Connection error, will retry"
                        );
                        last_error = Some(e.to_string());
                        continue;
                    }
                    return Err(ScrapeError::Http(e));
                }
            }
        }

        Err(ScrapeError::RetriesExhausted {
            url: url.to_string(),
            attempts: MAX_RETRIES,
            message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<String> {
        tracing::debug!(url = %url, "GET");
        let response = self.send_with_retry(url, || self.client.get(url).send())?;
        Ok(response.text()?)
    }

    fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String> {
        tracing::debug!(url = %url, fields = fields.len(), "POST form");
        let response =
            self.send_with_retry(url, || self.client.post(url).form(&fields.to_vec()).send())?;
        Ok(response.text()?)
    }

    fn head_content_type(&self, url: &str) -> Result<Option<String>> {
        tracing::debug!(url = %url, "HEAD");
        let response = match self.client.head(url).send() {
            Ok(r) => r,
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!(url = %url, error = %e, "HEAD failed, no content type");
                return Ok(None);
            }
            Err(e) => return Err(ScrapeError::Http(e)),
        };
        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "HEAD not successful");
            return Ok(None);
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(content_type)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_fetcher() {
        let fetcher = HttpFetcher::new();
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("legistar-scraper/"));
    }

    #[test]
    fn test_static_fetcher_records_posts() {
        use testing::StaticFetcher;

        let fetcher = StaticFetcher::new()
            .with_page("http://x/search", "<html></html>")
            .push_post_response("http://x/search", "<html>page1</html>");

        let fields = vec![("a".to_string(), "1".to_string())];
        let body = fetcher.post_form("http://x/search", &fields).unwrap();
        assert_eq!(body, "<html>page1</html>");

        // Queue exhausted: next POST falls back to the GET page.
        let body = fetcher.post_form("http://x/search", &[]).unwrap();
        assert_eq!(body, "<html></html>");

        assert_eq!(fetcher.recorded_posts().len(), 2);
        assert_eq!(fetcher.recorded_posts()[0].1, fields);
    }
}
