use std::time::Duration;

use rand::Rng;
use reqwest::{Client, multipart::Form};

use crate::{Error, Result, config::ScrapeConfig};

/// HTTP client shared by both scrape phases.
///
/// The cookie store matters: the first GET sets an ASP.NET session cookie
/// that must accompany the postback for the server to accept the tokens.
pub struct ScrapeClient {
    client: Client,
    mean_delay: Duration,
}

impl ScrapeClient {
    pub fn new(config: &ScrapeConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .user_agent("CMC-ICS-Rust/0.1.0")
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert("Accept", "text/html,*/*;q=0.8".parse().unwrap());
                headers.insert(
                    "Accept-Encoding",
                    "br;q=1.0, gzip;q=0.9, deflate;q=0.8".parse().unwrap(),
                );
                headers
            })
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            mean_delay: config.mean_request_delay,
        }
    }

    /// Map a transport error to a crate error carrying the failed URL.
    fn handle_error_req(&self, url: &str, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
            }
        } else {
            Error::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }

    /// GET a page and return the response body.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.handle_error_req(url, e))?;

        response
            .text()
            .await
            .map_err(|e| self.handle_error_req(url, e))
    }

    /// POST a multipart form and return the response body.
    pub async fn post_multipart_text(&self, url: &str, form: Form) -> Result<String> {
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.handle_error_req(url, e))?;

        response
            .text()
            .await
            .map_err(|e| self.handle_error_req(url, e))
    }

    /// Sleep a random duration before the next automated request.
    ///
    /// The delay is uniform over [0, 2x mean), so the configured mean holds
    /// over a scrape. The target site runs anti-automation defenses; this
    /// pacing is an operational requirement of scraping it at all, not a
    /// performance knob.
    pub async fn pace(&self) {
        let mean_ms = u64::try_from(self.mean_delay.as_millis()).unwrap_or(u64::MAX);
        if mean_ms == 0 {
            return;
        }
        let wait = rand::rng().random_range(0..mean_ms.saturating_mul(2));
        tracing::debug!(wait_ms = wait, "pacing before next request");
        tokio::time::sleep(Duration::from_millis(wait)).await;
    }
}
