//! Waits for the duplex connection to become usable before any traffic.
//!
//! A connection attempt that fails (refused, transport not up yet, handshake
//! error) is not an error here; the gate simply tries again after the poll
//! interval. The only failure the caller sees is the timeout.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Connection not ready after {attempts} attempts ({elapsed:?})")]
    TimedOut { attempts: u32, elapsed: Duration },
}

/// Retry cadence and give-up policy for [`await_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ReadyPolicy {
    pub fn new(poll_interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Some(Duration::from_secs(30)))
    }
}

/// Run `attempt` until it yields a ready connection, then resolve with it.
///
/// Resolves at most once. Each attempt is cut short if it would outlive the
/// overall timeout.
pub async fn await_ready<F, Fut, T, E>(
    policy: ReadyPolicy,
    mut attempt: F,
) -> Result<T, GateError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let deadline = policy.timeout.map(|t| started + t);
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);

        let outcome = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, attempt()).await {
                Ok(outcome) => Some(outcome),
                Err(_) => None,
            },
            None => Some(attempt().await),
        };

        match outcome {
            Some(Ok(ready)) => {
                tracing::debug!(attempts, elapsed = ?started.elapsed(), "Connection ready");
                return Ok(ready);
            }
            Some(Err(e)) => {
                tracing::trace!(attempt = attempts, error = %e, "Connection not ready yet");
            }
            None => {
                tracing::trace!(attempt = attempts, "Connection attempt cut off by timeout");
            }
        }

        if let Some(deadline) = deadline {
            if Instant::now() + policy.poll_interval > deadline {
                let elapsed = started.elapsed();
                tracing::warn!(attempts, ?elapsed, "Giving up waiting for connection");
                return Err(GateError::TimedOut { attempts, elapsed });
            }
        }

        tokio::time::sleep(policy.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(poll_ms: u64, timeout_ms: Option<u64>) -> ReadyPolicy {
        ReadyPolicy::new(
            Duration::from_millis(poll_ms),
            timeout_ms.map(Duration::from_millis),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_attempt() {
        let result = await_ready(policy(5, Some(100)), || async { Ok::<_, String>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_open() {
        let calls = Cell::new(0u32);
        let result = await_ready(policy(5, None), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 4 {
                    Err("not open")
                } else {
                    Ok("socket")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("socket"));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_policy_keeps_waiting() {
        let start = Instant::now();
        let calls = Cell::new(0u32);
        let result = await_ready(policy(5, None), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n <= 1000 { Err("down") } else { Ok(()) } }
        })
        .await;

        assert!(result.is_ok());
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() {
        let result = await_ready(policy(10, Some(35)), || async { Err::<(), _>("refused") }).await;
        match result {
            Err(GateError::TimedOut { attempts, elapsed }) => {
                assert_eq!(attempts, 4);
                assert!(elapsed <= Duration::from_millis(35));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_attempt_is_bounded_by_timeout() {
        let start = Instant::now();
        let result = await_ready(policy(5, Some(50)), || {
            std::future::pending::<Result<(), String>>()
        })
        .await;

        assert!(matches!(result, Err(GateError::TimedOut { attempts: 1, .. })));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
