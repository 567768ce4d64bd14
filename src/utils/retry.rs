// Retry helper for vendor calls, honouring Google retryDelay hints
// Author: kelexine (https://github.com/kelexine)

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const MAX_ATTEMPTS: u32 = 5;

/// Dig a `RetryInfo.retryDelay` hint out of a googleapis error body
/// (e.g. `"0.457639761s"`, `"40s"`). Capped at 60 seconds.
pub fn parse_retry_hint(error_body: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(error_body).ok()?;
    let details = parsed.get("error")?.get("details")?.as_array()?;

    for detail in details {
        if detail.get("@type")?.as_str()? == "type.googleapis.com/google.rpc.RetryInfo" {
            if let Some(delay) = detail.get("retryDelay").and_then(|v| v.as_str()) {
                return parse_seconds(delay);
            }
        }
    }

    None
}

fn parse_seconds(duration_str: &str) -> Option<Duration> {
    let seconds: f64 = duration_str.strip_suffix('s')?.parse().ok()?;
    let capped = seconds.min(60.0);
    Some(Duration::from_millis((capped * 1000.0) as u64))
}

/// Statuses worth another attempt. Everything else returns immediately.
pub fn is_transient(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn backoff_schedule() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,
        multiplier: 2.0,
        max_interval: Duration::from_secs(30),
        max_elapsed_time: Some(Duration::from_secs(120)),
        ..Default::default()
    }
}

/// Run `operation` until it succeeds, the status stops being transient, or
/// the attempt budget runs out. Waits the vendor's `retryDelay` hint when one
/// is present, exponential backoff otherwise.
pub async fn retry_request<F, Fut, T>(
    operation_name: &str,
    mut operation: F,
) -> Result<T, (u16, String)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (u16, String)>>,
{
    let mut backoff = backoff_schedule();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err((status, body)) => {
                if !is_transient(status) || attempt >= MAX_ATTEMPTS {
                    return Err((status, body));
                }

                let delay = match parse_retry_hint(&body) {
                    Some(hinted) => {
                        debug!(
                            "{} failed with {} (attempt {}), vendor asks for {}ms",
                            operation_name,
                            status,
                            attempt,
                            hinted.as_millis()
                        );
                        hinted
                    }
                    None => {
                        let fallback = backoff.next_backoff().unwrap_or(Duration::from_secs(30));
                        debug!(
                            "{} failed with {} (attempt {}), backing off {}ms",
                            operation_name,
                            status,
                            attempt,
                            fallback.as_millis()
                        );
                        fallback
                    }
                };

                tokio::time::sleep(delay).await;
            }
        }
    }
}
