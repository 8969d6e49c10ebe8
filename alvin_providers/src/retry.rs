use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry an async operation, sleeping `delays[i]` before attempt `i + 2`.
///
/// Errors rejected by `is_retryable` are returned immediately. After
/// `delays.len() + 1` attempts the last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    delays: &[Duration],
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = delays.len() + 1;

    for (attempt, delay) in (1..).zip(delays) {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if is_retryable(&e) => {
                warn!(
                    "Request failed (attempt {attempt}/{attempts}): {e}. Retrying after {}ms...",
                    delay.as_millis()
                );
                sleep(*delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    operation().await
}
