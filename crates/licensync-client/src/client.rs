//! License Manager HTTP transport
//!
//! Every operation is a `POST /` with the operation named in the
//! `X-Amz-Target` header and a PascalCase JSON body. Failed calls carry a
//! JSON error body whose `__type` names the error code.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use licensync_client::client::LicenseManagerClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = LicenseManagerClient::new("http://localhost:4566", Duration::from_secs(30))?;
//! let body = serde_json::json!({ "LicenseConfigurationArn": "arn:aws:license-manager:..." });
//! let response: serde_json::Value = client.call("GetLicenseConfiguration", &body).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::Context;
use licensync_core::config::EndpointConfig;
use licensync_core::ports::RemoteError;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Prefix of the `X-Amz-Target` header value
const TARGET_PREFIX: &str = "AWSLicenseManager";

/// Content type of the JSON 1.1 protocol
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Default retry-after duration when the header is missing
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Upper bound on a server-requested backoff
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Default number of transport-level retries for throttled requests
const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 3;

// ============================================================================
// Error body
// ============================================================================

/// Error body of a failed call
#[derive(Debug, Deserialize)]
struct ErrorBody {
    /// Error code, possibly prefixed by a namespace (`ns#Code`)
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Strips the namespace prefix and any `:uri` suffix from an error type
fn error_code(raw: &str) -> &str {
    let code = raw.rsplit('#').next().unwrap_or(raw);
    code.split(':').next().unwrap_or(code).trim()
}

/// Decodes a non-success response into a [`RemoteError`]
fn decode_error(status: StatusCode, headers: &HeaderMap, body: &str) -> RemoteError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_default();

    let code = parsed
        .as_ref()
        .and_then(|b| b.error_type.as_deref())
        .or_else(|| {
            headers
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
        })
        .map(error_code)
        .filter(|code| !code.is_empty());

    match code {
        Some(code) => RemoteError::from_code(code, message),
        None => RemoteError::Unavailable {
            status: status.as_u16(),
            message: if message.is_empty() {
                body.trim().to_string()
            } else {
                message
            },
        },
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout(format!("{operation}: {error}"))
    } else if error.is_decode() {
        RemoteError::InvalidResponse(format!("{operation}: {error}"))
    } else {
        RemoteError::Connection(format!("{operation}: {error}"))
    }
}

fn is_throttle(error: &RemoteError) -> bool {
    matches!(
        error,
        RemoteError::Throttling(_)
            | RemoteError::RateLimitExceeded(_)
            | RemoteError::Unavailable { status: 429, .. }
    )
}

/// Parses a `Retry-After` header value (integer seconds or HTTP-date)
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds).min(MAX_RETRY_AFTER);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let remaining = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        if let Ok(remaining) = remaining.to_std() {
            return remaining.min(MAX_RETRY_AFTER);
        }
        return Duration::ZERO;
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}

// ============================================================================
// LicenseManagerClient
// ============================================================================

/// HTTP client for License Manager API calls
///
/// Wraps `reqwest::Client` with target-header dispatch and error decoding.
/// Throttled calls are retried up to `max_throttle_retries` times, honoring
/// `Retry-After`; no other failure is retried.
#[derive(Debug, Clone)]
pub struct LicenseManagerClient {
    /// The underlying HTTP client
    client: Client,
    /// Endpoint URL, without trailing slash
    base_url: String,
    max_throttle_retries: u32,
    default_retry_after: Duration,
}

impl LicenseManagerClient {
    /// Creates a client for the given endpoint
    ///
    /// # Arguments
    /// * `base_url` - Endpoint URL, e.g. `https://license-manager.us-east-1.amazonaws.com`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
            default_retry_after: DEFAULT_RETRY_AFTER,
        })
    }

    /// Creates a client from the `endpoint` configuration section
    pub fn from_config(config: &EndpointConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.resolved_url(), config.request_timeout())?
            .with_max_throttle_retries(config.max_throttle_retries))
    }

    /// Sets how many times a throttled call is retried (0 disables retries)
    pub fn with_max_throttle_retries(mut self, retries: u32) -> Self {
        self.max_throttle_retries = retries;
        self
    }

    /// Sets the backoff used when a throttled response has no `Retry-After`
    pub fn with_default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    /// Returns the endpoint URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invokes one operation and decodes its response
    ///
    /// # Arguments
    /// * `operation` - Operation name, e.g. `GetLicenseConfiguration`
    /// * `request` - Request body, serialized as JSON
    ///
    /// # Errors
    /// Returns the decoded service error, or a transport failure
    pub async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let target = format!("{TARGET_PREFIX}.{operation}");
        let url = format!("{}/", self.base_url);
        let body = serde_json::to_vec(request).map_err(|e| {
            RemoteError::InvalidResponse(format!("{operation}: failed to encode request: {e}"))
        })?;

        let mut attempt = 0;
        loop {
            debug!(operation, attempt, "Sending License Manager request");

            let response = self
                .client
                .post(&url)
                .header("X-Amz-Target", &target)
                .header(CONTENT_TYPE, AMZ_JSON)
                .body(body.clone())
                .send()
                .await
                .map_err(|e| transport_error(operation, e))?;

            let status = response.status();
            if status.is_success() {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| transport_error(operation, e))?;
                let bytes: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };

                if attempt > 0 {
                    info!(operation, attempt, "Request succeeded after retry");
                }

                return serde_json::from_slice(bytes).map_err(|e| {
                    RemoteError::InvalidResponse(format!("{operation}: {e}"))
                });
            }

            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            let error = decode_error(status, &headers, &text);

            if !is_throttle(&error) || attempt >= self.max_throttle_retries {
                debug!(operation, %status, code = error.code(), "License Manager request failed");
                return Err(error);
            }

            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(|v| parse_retry_after(v, self.default_retry_after))
                .unwrap_or(self.default_retry_after);

            warn!(
                operation,
                attempt,
                retry_after_ms = retry_after.as_millis() as u64,
                "Request throttled, backing off"
            );

            tokio::time::sleep(retry_after).await;
            attempt += 1;
        }
    }
}
