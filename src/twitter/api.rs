//! Core Twitter API utilities.
//!
//! This module contains the low-level request helper used by the search
//! source: it sends bearer-authenticated GET requests and waits out rate
//! limits (HTTP 429) before retrying, the way the official clients do when
//! told to wait on rate limits.

use log::{debug, error, info, warn};
use reqwest::Client;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Header carrying the epoch second at which the rate-limit window resets.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Wait used when a 429 response carries no usable reset header (one full window).
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60);

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_chars`: Maximum number of characters before truncation
pub(crate) fn sanitize_for_logging(text: &str, max_chars: usize) -> String {
    let mut sanitized: String = text
        .chars()
        .take(max_chars)
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if text.chars().count() > max_chars {
        sanitized.push_str(&format!("... [truncated, {} total bytes]", text.len()));
    }
    sanitized
}

/// Computes how long to sleep before retrying a rate-limited request.
///
/// `reset_epoch` is the parsed `x-rate-limit-reset` header. The wait lasts until
/// one second past the reset, never less than one second.
pub(crate) fn rate_limit_wait(reset_epoch: Option<u64>, now_epoch: u64) -> Duration {
    match reset_epoch {
        Some(reset) => Duration::from_secs(reset.saturating_sub(now_epoch) + 1),
        None => DEFAULT_RATE_LIMIT_WAIT,
    }
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Sends a bearer-authenticated GET request, sleeping through rate limits.
///
/// # Parameters
///
/// - `client`: Shared HTTP client
/// - `url`: Fully built request URL
/// - `auth_header`: Value for the `Authorization` header
/// - `operation_name`: Human-readable name for the operation (for logging)
///
/// # Returns
///
/// - `Ok(String)`: The response body on a 2xx status
/// - `Err(Error::Api)`: Any other non-429 status
/// - `Err(Error::Http)`: Transport failures
pub(crate) async fn get_with_rate_limit(
    client: &Client,
    url: &str,
    auth_header: &str,
    operation_name: &str,
) -> Result<String> {
    loop {
        debug!("Sending GET request for operation: {}", operation_name);
        debug!("Request headers: Authorization: Bearer [REDACTED]");

        let response = client
            .get(url)
            .header("Authorization", auth_header)
            .send()
            .await?;

        let status = response.status();
        debug!(
            "Received response with status: {} for operation: {}",
            status, operation_name
        );

        if status.is_success() {
            let response_text = response.text().await?;
            debug!(
                "Response summary for '{}': {} bytes received",
                operation_name,
                response_text.len()
            );
            return Ok(response_text);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset = response
                .headers()
                .get(RATE_LIMIT_RESET_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let wait = rate_limit_wait(reset, now_epoch());
            warn!(
                "Rate limit exceeded for operation '{}'. Sleeping for {} seconds.",
                operation_name,
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
            info!("Retrying operation '{}' after rate-limit wait", operation_name);
            continue;
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("Operation '{}' failed - Status: {}", operation_name, status);
        debug!(
            "Error response for '{}': {}",
            operation_name,
            sanitize_for_logging(&error_text, 200)
        );
        return Err(Error::Api {
            operation: operation_name.to_string(),
            status: status.as_u16(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_control_characters() {
        assert_eq!(sanitize_for_logging("a\nb\tc\u{7}", 50), "a b c?");
    }

    #[test]
    fn sanitize_truncates_on_char_boundary() {
        let text = "ééééé";
        let out = sanitize_for_logging(text, 2);
        assert!(out.starts_with("éé... [truncated, 10 total bytes]"));
    }

    #[test]
    fn rate_limit_wait_runs_past_reset() {
        assert_eq!(rate_limit_wait(Some(1_000), 990), Duration::from_secs(11));
        assert_eq!(rate_limit_wait(Some(1_000), 1_000), Duration::from_secs(1));
        assert_eq!(rate_limit_wait(Some(900), 1_000), Duration::from_secs(1));
        assert_eq!(rate_limit_wait(None, 1_000), DEFAULT_RATE_LIMIT_WAIT);
    }
}
