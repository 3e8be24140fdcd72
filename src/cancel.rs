//! Cooperative cancellation and time budgets for layout runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::LayoutError;

/// Shared flag flipped by the orchestrator when a run is superseded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Limits checked by the pipeline between phases and between sweep passes.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    cancel: CancelToken,
    // `Instant::now` is unavailable on wasm32-unknown-unknown, so the clock is
    // only read when a time budget is set.
    deadline: Option<(Instant, Duration)>,
}

impl Budget {
    pub fn new(cancel: CancelToken, time_budget: Option<Duration>) -> Self {
        Self {
            cancel,
            deadline: time_budget.map(|budget| (Instant::now() + budget, budget)),
        }
    }

    /// No cancellation and no deadline.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|(deadline, _)| Instant::now() >= deadline)
    }

    pub fn check_cancelled(&self) -> Result<(), LayoutError> {
        if self.is_cancelled() {
            return Err(LayoutError::Cancelled);
        }
        Ok(())
    }

    /// Fails with `Cancelled` or, once the deadline has passed, with `Timeout`.
    pub fn checkpoint(&self, phase: &'static str) -> Result<(), LayoutError> {
        self.check_cancelled()?;
        match self.deadline {
            Some((deadline, budget)) if Instant::now() >= deadline => {
                Err(LayoutError::Timeout { phase, budget })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let budget = Budget::new(token.clone(), None);

        assert!(budget.checkpoint("layering").is_ok());
        token.cancel();
        assert_eq!(budget.checkpoint("layering"), Err(LayoutError::Cancelled));
    }

    #[test]
    fn test_zero_budget_times_out() {
        let budget = Budget::new(CancelToken::new(), Some(Duration::ZERO));

        assert!(budget.is_expired());
        assert!(matches!(
            budget.checkpoint("layering"),
            Err(LayoutError::Timeout { phase: "layering", .. })
        ));
    }

    #[test]
    fn test_unbounded_never_expires() {
        let budget = Budget::unbounded();
        assert!(!budget.is_expired());
        assert!(budget.checkpoint("placement").is_ok());
    }
}
