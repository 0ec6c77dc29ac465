// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry helper.
//!
//! Returns the last error instead of terminating the process; the
//! composition root decides whether a failure is fatal.

use std::time::Duration;

use relayq_core::RelayqError;
use tracing::warn;

/// Runs `op` up to `attempts` times with a fixed `delay` between attempts.
///
/// Returns the first success or the error from the final attempt. `label`
/// names the operation in retry logs.
pub async fn bounded<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    label: &str,
    mut op: F,
) -> Result<T, RelayqError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RelayqError>>,
{
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(attempt, attempts, error = %e, "{label} failed");
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| RelayqError::upstream(format!("{label} failed with zero attempts"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = bounded(3, Duration::ZERO, "test op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, RelayqError>(42) }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_on_final_attempt() {
        let calls = AtomicU32::new(0);
        let result = bounded(3, Duration::ZERO, "test op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(RelayqError::upstream("transient"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = bounded(3, Duration::ZERO, "test op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(RelayqError::upstream(format!("failure {n}"))) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(result.unwrap_err().to_string().contains("failure 2"));
    }
}
