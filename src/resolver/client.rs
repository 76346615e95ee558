//! HTTP client shared by remote repositories
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry logic (max 3 retries)
//! - Rate limit handling
//! - 404 reported as "not present" rather than as an error

use crate::error::ResolveError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (60 seconds; jars can be large)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("jarshade/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ResolveError::network_error("", format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Download a file. `Ok(None)` means the server answered 404.
    pub async fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ResolveError::RateLimitExceeded {
                            url: url.to_string(),
                        });
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                            continue;
                        }
                        break;
                    }

                    if status == StatusCode::NOT_FOUND {
                        debug!("404 {}", url);
                        return Ok(None);
                    }

                    if !status.is_success() {
                        return Err(ResolveError::network_error(url, format!("HTTP {}", status)));
                    }

                    match response.bytes().await {
                        Ok(body) => return Ok(Some(body.to_vec())),
                        Err(e) => {
                            last_error = Some(ResolveError::network_error(
                                url,
                                format!("failed to read response body: {}", e),
                            ));
                        }
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ResolveError::timeout(url));
                    } else {
                        last_error = Some(ResolveError::network_error(url, e.to_string()));
                    }
                }
            }

            if attempt < self.max_retries {
                // Wait before retrying with exponential backoff
                tokio::time::sleep(Duration::from_millis(delay)).await;
                delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| ResolveError::network_error(url, "unknown error")))
    }
}
