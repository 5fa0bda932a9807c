//! Shared HTTP plumbing for provider adapters.
//!
//! Provides client construction with bounded timeouts and retry of 429
//! responses with exponential backoff.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::warn;

use crate::ocr::backend::{OcrError, ProviderKind};

/// Maximum retry attempts on rate limit (429) responses.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff.
const BACKOFF_BASE_MS: u64 = 1000;

/// Build a reqwest client with a request timeout.
pub fn build_client(backend: ProviderKind, timeout: Duration) -> Result<Client, OcrError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| OcrError::BackendNotAvailable(format!("{} HTTP client: {}", backend, e)))
}

/// Parse a numeric Retry-After header value (seconds), capped at 60s.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    header_value?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Exponential backoff delay for a given attempt, capped at 60s.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(60_000))
}

/// Send a request, retrying on 429 with exponential backoff.
///
/// Returns the first non-429 response. If all retries are exhausted,
/// returns `OcrError::RateLimited`.
pub async fn send_with_retry<F>(backend: ProviderKind, make_request: F) -> Result<Response, OcrError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let response = make_request()
            .send()
            .await
            .map_err(|e| OcrError::request(backend, e))?;

        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after_secs = retry_after.as_deref().and_then(|s| s.trim().parse::<u64>().ok());

        if attempt >= MAX_RETRIES {
            return Err(OcrError::RateLimited {
                backend,
                retry_after_secs,
            });
        }

        let wait = parse_retry_after(retry_after.as_deref())
            .unwrap_or_else(|| backoff_delay(attempt, BACKOFF_BASE_MS));
        warn!(
            "{} rate limited (attempt {}), waiting {:?}",
            backend,
            attempt + 1,
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

/// Turn a non-2xx response into `OcrError::Api`.
pub async fn ensure_success(backend: ProviderKind, response: Response) -> Result<Response, OcrError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(OcrError::Api {
        backend,
        status,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3, 1000), Duration::from_millis(8000));
        assert_eq!(backoff_delay(10, 1000), Duration::from_secs(60));
        assert_eq!(backoff_delay(200, 1000), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some(" 120 ")), Some(Duration::from_secs(60)));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), None);
        assert_eq!(parse_retry_after(None), None);
    }
}
