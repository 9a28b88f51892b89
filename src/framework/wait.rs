//! Bounded polling for a condition
//!
//! The condition is checked immediately and then once per tick. Between
//! ticks the caller's task sleeps, waking early only if an error arrives
//! on the optional abort channel.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::common::{Error, Result};

/// Poll `condition` every `tick` until it holds or `timeout` elapses
///
/// Returns `Ok(())` the first time the condition evaluates true. An error
/// received on `errs` before that is returned as-is. If `errs` closes
/// without delivering an error, polling continues without it. When the
/// deadline passes the condition is evaluated one last time, so success
/// wins over a timeout detected in the same tick.
pub async fn wait_for<F, Fut>(
    tick: Duration,
    timeout: Duration,
    mut errs: Option<&mut mpsc::Receiver<Error>>,
    mut condition: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let deadline = start + timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if condition().await {
            tracing::debug!(attempts, elapsed = ?start.elapsed(), "Condition met");
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            // An error that arrived while the condition ran still wins
            if let Some(err) = errs.as_deref_mut().and_then(|rx| rx.try_recv().ok()) {
                return Err(err);
            }
            tracing::debug!(attempts, ?timeout, "Condition not met before deadline");
            return Err(Error::WaitTimeout(timeout));
        }
        tracing::trace!(attempts, "Condition not met yet");

        let sleep = tokio::time::sleep(tick.min(deadline - now));
        tokio::pin!(sleep);

        let closed = match errs.as_deref_mut() {
            Some(rx) => {
                tokio::select! {
                    biased;
                    received = rx.recv() => match received {
                        Some(err) => return Err(err),
                        None => true,
                    },
                    _ = &mut sleep => false,
                }
            }
            None => {
                (&mut sleep).await;
                false
            }
        };

        if closed {
            tracing::trace!("Abort channel closed without an error");
            errs = None;
            sleep.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_secs(1);
    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_true_on_first_check_returns_without_sleeping() {
        let start = Instant::now();
        let mut calls = 0;
        wait_for(TICK, TIMEOUT, None, || {
            calls += 1;
            async { true }
        })
        .await
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_true_times_out_at_deadline() {
        let start = Instant::now();
        let mut calls = 0;
        let err = wait_for(TICK, TIMEOUT, None, || {
            calls += 1;
            async { false }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::WaitTimeout(t) if t == TIMEOUT));
        assert_eq!(start.elapsed(), TIMEOUT);
        // t = 0, 1, ..., 10
        assert_eq!(calls, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_becomes_true_after_some_ticks() {
        let start = Instant::now();
        let mut calls = 0;
        wait_for(TICK, TIMEOUT, None, || {
            calls += 1;
            let done = calls == 4;
            async move { done }
        })
        .await
        .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_at_deadline_wins() {
        let timeout = Duration::from_secs(3);
        let mut calls = 0;
        let result = wait_for(TICK, timeout, None, || {
            calls += 1;
            let done = calls == 4;
            async move { done }
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_is_capped_at_deadline() {
        let start = Instant::now();
        let timeout = Duration::from_secs(3);
        let err = wait_for(Duration::from_secs(60), timeout, None, || async { false })
            .await
            .unwrap_err();
        assert!(err.is_wait_timeout());
        assert_eq!(start.elapsed(), timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_on_channel_is_returned_before_deadline() {
        let (tx, mut rx) = mpsc::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            let _ = tx.send(Error::assertion("build failed")).await;
        });

        let start = Instant::now();
        let err = wait_for(TICK, TIMEOUT, Some(&mut rx), || async { false })
            .await
            .unwrap_err();
        match err {
            Error::TestAssertion(msg) => assert_eq!(msg, "build failed"),
            other => panic!("expected the channel error, got {other:?}"),
        }
        assert_eq!(start.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_during_slow_condition_beats_timeout() {
        let (tx, mut rx) = mpsc::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = tx.send(Error::assertion("build failed")).await;
        });

        let err = wait_for(
            Duration::from_millis(100),
            Duration::from_secs(1),
            Some(&mut rx),
            || async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                false
            },
        )
        .await
        .unwrap_err();
        match err {
            Error::TestAssertion(msg) => assert_eq!(msg, "build failed"),
            other => panic!("expected the channel error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_keeps_polling() {
        let (tx, mut rx) = mpsc::channel::<Error>(1);
        drop(tx);

        let start = Instant::now();
        let mut calls = 0;
        wait_for(TICK, TIMEOUT, Some(&mut rx), || {
            calls += 1;
            let done = calls == 3;
            async move { done }
        })
        .await
        .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_error_beats_unmet_condition() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(Error::Internal("early".to_string())).await.unwrap();

        let start = Instant::now();
        let err = wait_for(TICK, TIMEOUT, Some(&mut rx), || async { false })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(ref m) if m == "early"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
