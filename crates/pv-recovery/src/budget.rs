//! Search budget: wall clock, attempt count, caller cancellation.
//!
//! Checked cooperatively before every attempt. An attempt already running
//! is allowed to finish; no new one starts once any limit is hit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use pv_core::config::SearchConfig;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub max_duration: Duration,
    pub max_attempts: u64,
}

impl From<&SearchConfig> for SearchBudget {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_duration: config.max_duration(),
            max_attempts: config.max_attempts,
        }
    }
}

/// Why a search stopped before exhausting its candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Deadline,
    AttemptLimit,
    Cancelled,
}

/// Budget state for one request. Shared by reference across rayon workers.
#[derive(Debug)]
pub struct BudgetClock {
    budget: SearchBudget,
    started: Instant,
    attempts: AtomicU64,
    cancel: CancellationToken,
    stopped: OnceLock<StopReason>,
}

impl BudgetClock {
    pub fn start(budget: SearchBudget, cancel: CancellationToken) -> Self {
        Self {
            budget,
            started: Instant::now(),
            attempts: AtomicU64::new(0),
            cancel,
            stopped: OnceLock::new(),
        }
    }

    /// Reserve one attempt, or report why no more may start.
    pub fn begin_attempt(&self) -> Result<(), StopReason> {
        self.reserve(1).map(|_| ())
    }

    /// Reserve up to `wanted` attempts at once and return how many were
    /// granted. Fewer than `wanted` means the attempt limit is about to be
    /// reached.
    pub fn reserve(&self, wanted: u64) -> Result<u64, StopReason> {
        self.check()?;
        if wanted == 0 {
            return Ok(0);
        }
        let max = self.budget.max_attempts;
        match self
            .attempts
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then(|| n + wanted.min(max - n))
            }) {
            Ok(previous) => Ok(wanted.min(max - previous)),
            Err(_) => Err(self.stop(StopReason::AttemptLimit)),
        }
    }

    /// Check cancellation and the deadline without consuming an attempt.
    pub fn check(&self) -> Result<(), StopReason> {
        if let Some(reason) = self.stopped.get() {
            return Err(*reason);
        }
        if self.cancel.is_cancelled() {
            return Err(self.stop(StopReason::Cancelled));
        }
        if self.started.elapsed() >= self.budget.max_duration {
            return Err(self.stop(StopReason::Deadline));
        }
        Ok(())
    }

    fn stop(&self, reason: StopReason) -> StopReason {
        *self.stopped.get_or_init(|| reason)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stopped.get().copied()
    }
}
