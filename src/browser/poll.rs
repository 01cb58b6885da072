//! Bounded retry / poll primitive
//!
//! The remote console never notifies anybody; the only way to observe it
//! is to look again later. Every wait in the crate goes through
//! [`poll_until`] and an injectable [`Clock`].

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::core::Result;

/// Source of sleeps
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How often and how long to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of evaluations
    pub attempts: u32,
    /// Pause between two evaluations
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Evaluate exactly once
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// One attempt per interval for the whole duration
    pub fn for_duration(total: Duration, interval: Duration) -> Self {
        let attempts = if interval.is_zero() {
            1
        } else {
            (total.as_millis() / interval.as_millis()).max(1)
        };
        Self::new(u32::try_from(attempts).unwrap_or(u32::MAX), interval)
    }
}

/// A condition evaluated against some target
///
/// `Ok(None)` means "not yet"; `Ok(Some(_))` ends the poll.
#[async_trait]
pub trait Probe<S: Send>: Send {
    type Output: Send;

    async fn probe(&mut self, target: &mut S) -> Result<Option<Self::Output>>;
}

/// Evaluate `probe` up to `policy.attempts` times, sleeping between
/// attempts but not after the last one.
///
/// Transient errors count as a miss. Any other error is returned at once.
/// Exhausting the budget yields `Ok(None)`; callers that never expect
/// absence turn that into their own error.
pub async fn poll_until<S, P>(
    clock: &dyn Clock,
    policy: PollPolicy,
    target: &mut S,
    probe: &mut P,
) -> Result<Option<P::Output>>
where
    S: Send,
    P: Probe<S>,
{
    for attempt in 1..=policy.attempts {
        match probe.probe(target).await {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) if e.is_transient() => {
                debug!(attempt, error = %e, "Transient error while polling");
            }
            Err(e) => return Err(e),
        }

        if attempt < policy.attempts {
            clock.sleep(policy.interval).await;
        }
    }

    Ok(None)
}
