//! HTTP client with per-request timeout and retry logic.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::config::HttpConfig;
use shared::FinderError;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Thin wrapper over `reqwest::Client` mapping failures onto [`FinderError`].
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// HTTP client
    client: Client,
    /// Maximum retries for transient failures
    max_retries: u32,
    /// Base delay for retry (exponential backoff)
    retry_delay_ms: u64,
}

impl HttpClient {
    /// Create a new client from the `[http]` config section
    pub fn new(config: &HttpConfig) -> Result<Self, FinderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FinderError::network("<client>", e))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// GET `url` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FinderError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(url = %url, error = %e, "Failed to parse response");
            FinderError::malformed(format!("{}: {}", url, e))
        })
    }

    /// GET `url` and return the body as text
    pub async fn get_text(&self, url: &str) -> Result<String, FinderError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| map_reqwest_error(url, e))
    }

    /// Make a GET request, retrying transient failures
    async fn get(&self, url: &str) -> Result<Response, FinderError> {
        let mut attempt = 0;

        loop {
            debug!(url = %url, attempt = attempt + 1, "Making request");

            let error = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!(url = %url, status = %status, "Request successful");
                        return Ok(response);
                    }

                    let error = FinderError::network(url, format!("status {}", status));
                    if !status.is_server_error() {
                        // Client errors won't change on retry
                        warn!(url = %url, status = %status, "Request rejected");
                        return Err(error);
                    }
                    error
                }
                Err(e) => map_reqwest_error(url, e),
            };

            if attempt >= self.max_retries {
                warn!(
                    url = %url,
                    error = %error,
                    attempts = attempt + 1,
                    "Request failed"
                );
                return Err(error);
            }

            let delay = Duration::from_millis(self.retry_delay_ms * 2u64.pow(attempt));
            debug!(
                url = %url,
                error = %error,
                delay_ms = delay.as_millis(),
                "Retrying after delay"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

fn map_reqwest_error(url: &str, e: reqwest::Error) -> FinderError {
    if e.is_timeout() {
        FinderError::Timeout {
            url: url.to_string(),
        }
    } else {
        FinderError::network(url, e)
    }
}
