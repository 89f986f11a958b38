//! LogicMonitor REST client implementation

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client as HttpClient;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::LogicMonitorApi;
use super::auth::LmV1Signer;
use super::rate_limit::ThrottleSet;
use super::retry::{RetryPolicy, StatusClass, sleep_or_cancel};
use crate::config::Credentials;
use crate::error::{ApiError, Result};

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default request rate for a resource path after it answered 429
const DEFAULT_THROTTLE_PER_SECOND: u32 = 2;

/// Outcome of a single HTTP attempt that may be retried.
enum Attempt {
    Done(Value),
    RateLimited {
        retry_after: Option<String>,
        body: String,
    },
    Transient {
        cause: String,
        body: String,
    },
}

/// LogicMonitor API client
pub struct LogicMonitorClient {
    http: HttpClient,
    base_url: String,
    signer: LmV1Signer,
    retry: RetryPolicy,
    throttles: ThrottleSet,
    cancel: CancellationToken,
}

impl LogicMonitorClient {
    /// Create a client for the company named in `credentials`.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("lmexport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: credentials.base_url(None),
            signer: LmV1Signer::new(credentials),
            retry: RetryPolicy::default(),
            throttles: ThrottleSet::new(DEFAULT_THROTTLE_PER_SECOND),
            cancel: CancellationToken::new(),
        })
    }

    /// Send requests to a different host (scheme + host, no path).
    pub fn with_api_host(mut self, api_host: &str) -> Self {
        self.base_url = format!("{}/santaba/rest", api_host.trim_end_matches('/'));
        self
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the request rate applied to a resource path after it answered 429.
    pub fn with_throttle(mut self, per_second: u32) -> Self {
        self.throttles = ThrottleSet::new(per_second);
        self
    }

    /// Abort in-flight requests and backoff sleeps when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The REST base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cancelled(resource_path: &str) -> ApiError {
        ApiError::Cancelled {
            path: resource_path.to_string(),
        }
    }

    /// Perform one signed GET and classify the result.
    ///
    /// Non-retryable failures come back as `Err`; retryable ones as `Ok(Attempt::..)`.
    async fn attempt(
        &self,
        resource_path: &str,
        headers: HeaderMap,
        query: &[(&'static str, String)],
    ) -> Result<Attempt> {
        let url = format!("{}{}", self.base_url, resource_path);

        let exchange = async {
            let response = self.http.get(&url).headers(headers).query(query).send().await?;
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await;
            Ok::<_, reqwest::Error>((status, retry_after, body))
        };

        let (status, retry_after, body) = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Self::cancelled(resource_path).into()),
            result = exchange => match result {
                Ok(parts) => parts,
                Err(e) => {
                    return Ok(Attempt::Transient {
                        cause: network_cause(&e),
                        body: String::new(),
                    });
                }
            },
        };

        let class = StatusClass::of(status);
        let body = match body {
            Ok(body) => body,
            // A broken body on a 200 is a truncated transfer; elsewhere the status decides
            Err(e) if class == StatusClass::Success => {
                return Ok(Attempt::Transient {
                    cause: format!("reading response body: {}", network_cause(&e)),
                    body: String::new(),
                });
            }
            Err(_) => String::new(),
        };

        match class {
            StatusClass::Success => {
                let value = serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse {
                    path: resource_path.to_string(),
                    reason: format!("body is not valid JSON ({}): {}", e, truncate(&body, 200)),
                })?;
                Ok(Attempt::Done(value))
            }
            StatusClass::Auth => Err(ApiError::Auth {
                path: resource_path.to_string(),
                status,
                body,
            }
            .into()),
            StatusClass::RateLimited => Ok(Attempt::RateLimited { retry_after, body }),
            StatusClass::Transient => Ok(Attempt::Transient {
                cause: format!("HTTP {}", status),
                body,
            }),
            StatusClass::Fatal => Err(ApiError::Status {
                path: resource_path.to_string(),
                status,
                body,
            }
            .into()),
        }
    }
}

#[async_trait]
impl LogicMonitorApi for LogicMonitorClient {
    async fn get_json(
        &self,
        resource_path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value> {
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Self::cancelled(resource_path).into());
            }
            attempt += 1;

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(Self::cancelled(resource_path).into()),
                _ = self.throttles.wait_for(resource_path) => {}
            }

            // Signed per attempt: the timestamp is part of the signature
            let headers = self.signer.headers("GET", resource_path, "")?;
            debug!(
                "GET {} (attempt {}/{})",
                resource_path, attempt, self.retry.max_attempts
            );

            let delay = match self.attempt(resource_path, headers, query).await? {
                Attempt::Done(value) => {
                    if attempt > 1 {
                        debug!("GET {} succeeded after {} attempts", resource_path, attempt);
                    }
                    return Ok(value);
                }
                Attempt::RateLimited { retry_after, body } => {
                    self.throttles.activate(resource_path).await;
                    if !self.retry.can_retry(attempt) {
                        return Err(ApiError::RateLimited {
                            path: resource_path.to_string(),
                            attempts: attempt,
                            body,
                        }
                        .into());
                    }
                    let delay = self.retry.rate_limit_delay(retry_after.as_deref());
                    warn!(
                        "GET {} rate limited (attempt {}/{}), retrying in {:.1}s",
                        resource_path,
                        attempt,
                        self.retry.max_attempts,
                        delay.as_secs_f64()
                    );
                    delay
                }
                Attempt::Transient { cause, body } => {
                    if !self.retry.can_retry(attempt) {
                        return Err(ApiError::Transient {
                            path: resource_path.to_string(),
                            attempts: attempt,
                            cause,
                            body,
                        }
                        .into());
                    }
                    let delay = self.retry.backoff_with_jitter(attempt);
                    warn!(
                        "GET {} failed with {} (attempt {}/{}), retrying in {:.1}s",
                        resource_path,
                        cause,
                        attempt,
                        self.retry.max_attempts,
                        delay.as_secs_f64()
                    );
                    delay
                }
            };

            if !sleep_or_cancel(delay, &self.cancel).await {
                return Err(Self::cancelled(resource_path).into());
            }
        }
    }
}

/// Describe a transport-level failure.
fn network_cause(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("failed to connect: {}", err)
    } else {
        format!("network error: {}", err)
    }
}

/// Shorten a response body for error messages.
fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let head: String = body.chars().take(max_chars).collect();
    format!("{}...", head)
}
