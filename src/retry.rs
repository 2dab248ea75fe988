//! Bounded retry of selection passes, tolerating late-arriving DOM content.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::select::PassOutcome;
use crate::Result;

/// Retry state machine. `Converged` and `GaveUp` are terminal; `GaveUp`
/// is logged but is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Converged,
    GaveUp,
}

impl RetryState {
    /// Transition after an attempt's outcome.
    pub fn next(self, converged: bool, max_attempts: u32) -> RetryState {
        match self {
            RetryState::Attempting(_) if converged => RetryState::Converged,
            RetryState::Attempting(n) if n >= max_attempts => RetryState::GaveUp,
            RetryState::Attempting(n) => RetryState::Attempting(n + 1),
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Converged | RetryState::GaveUp)
    }
}

/// Run `attempt` until it converges or `max_attempts` is reached, sleeping
/// `interval` between attempts. Performs at most `max_attempts` attempts;
/// zero means no attempt at all.
pub async fn drive<F, Fut>(max_attempts: u32, interval: Duration, mut attempt: F) -> Result<RetryState>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PassOutcome>>,
{
    if max_attempts == 0 {
        return Ok(RetryState::GaveUp);
    }

    let mut state = RetryState::Attempting(1);
    loop {
        let outcome = attempt().await?;
        state = state.next(outcome.converged(), max_attempts);
        match state {
            RetryState::Converged => {
                debug!("selection converged");
                return Ok(state);
            }
            RetryState::GaveUp => {
                warn!(
                    "selection did not converge after {} attempts ({} groups unchecked)",
                    max_attempts, outcome.unchecked
                );
                return Ok(state);
            }
            RetryState::Attempting(n) => {
                debug!("attempt {}/{}: {} groups unchecked, retrying", n - 1, max_attempts, outcome.unchecked);
                tokio::time::sleep(interval).await;
            }
        }
    }
}
