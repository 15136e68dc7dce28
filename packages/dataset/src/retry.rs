//! HTTP retry helpers for transient errors.
//!
//! The HTTP score source calls [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! automatic retry with exponential backoff for transient failures
//! (timeouts, connection resets, server errors, rate limiting).
//!
//! # Usage
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url)).await?;
//! ```

use std::time::Duration;

use crate::FetchError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (500ms, 1s, 2s) the total wait before giving
/// up is 3.5 seconds, short enough that a map selection never hangs for
/// long on a dead backend.
const MAX_RETRIES: u32 = 3;

/// Delay before the first retry; doubled on every further attempt.
const BASE_DELAY: Duration = Duration::from_millis(500);

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Retries up to [`MAX_RETRIES`] times on connection errors, timeouts,
/// HTTP 429, and HTTP 5xx. Does **not** retry other HTTP 4xx; those are
/// permanent.
///
/// # Errors
///
/// Returns [`FetchError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body is not valid
/// JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, MAX_RETRIES).await?;
    let url = response.url().to_string();
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview = if text.len() > BODY_PREVIEW_LEN {
            format!("{}...", text.chars().take(BODY_PREVIEW_LEN).collect::<String>())
        } else {
            text.clone()
        };
        log::error!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            text.len(),
        );
        FetchError::Json(e)
    })
}

/// Core retry loop.
///
/// Sends the request built by `build_request`, retrying on transient
/// errors up to `max_retries` times with exponential backoff. Returns the
/// successful [`reqwest::Response`].
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F, max_retries: u32) -> Result<reqwest::Response, FetchError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<FetchError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(FetchError::Http(e));
                    continue;
                }
                return Err(FetchError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                let url = response.url().to_string();

                if is_retryable_status(status) {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status} from {url}");
                        last_error = Some(FetchError::Status {
                            status: status.as_u16(),
                            url,
                        });
                        continue;
                    }
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url,
                    });
                }

                if status.is_client_error() {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url,
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FetchError::Source {
        message: "request failed after all retries".to_string(),
    }))
}

/// Delay before retry number `attempt` (1-based).
fn backoff(attempt: u32) -> Duration {
    BASE_DELAY * (1u32 << attempt.saturating_sub(1).min(16))
}

/// 429 and 5xx are worth retrying; everything else is final.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(2));
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(reqwest::StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(reqwest::StatusCode::OK));
    }
}
