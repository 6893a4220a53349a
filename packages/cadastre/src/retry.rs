//! Exponential backoff for transient cadastre failures.
//!
//! Only errors for which [`CadastreError::is_transient`] holds are
//! retried. A well-formed "no parcel" answer or an unparseable body ends
//! the loop immediately.

use std::future::Future;
use std::time::Duration;

use crate::CadastreError;

/// Runs `operation` up to `max_attempts` times.
///
/// After failed attempt `n` (0-based) the loop waits `base_delay × 2^n`
/// before trying again, so the defaults (3 attempts, 2s) wait 2s then 4s.
/// The operation receives the attempt number.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error.
pub async fn with_backoff<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, CadastreError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CadastreError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                let delay = base_delay.saturating_mul(1u32 << attempt.min(16));
                log::warn!(
                    "  transient error (attempt {}/{max_attempts}): {e}, retrying in {delay:?}",
                    attempt + 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
