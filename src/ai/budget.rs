//! Process-wide budget for live model calls.

use std::sync::atomic::{AtomicU32, Ordering};

/// Counts live upstream calls against a fixed per-process allowance.
///
/// Once the allowance is spent every further consumer is told to use the
/// canned generator instead. The counter never resets while the process runs.
#[derive(Debug)]
pub struct CallBudget {
    limit: u32,
    used: AtomicU32,
}

impl CallBudget {
    /// Build a budget with the given allowance.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// Try to spend one call. Returns the calls remaining after this one,
    /// or `None` when the allowance is exhausted.
    pub fn try_consume(&self) -> Option<u32> {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .ok()
            .map(|previous| self.limit - previous - 1)
    }

    /// Calls spent so far.
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Acquire).min(self.limit)
    }

    /// Calls left in the allowance.
    pub fn remaining(&self) -> u32 {
        self.limit - self.used()
    }

    /// The configured allowance.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_down_to_zero_then_refuses() {
        let budget = CallBudget::new(3);
        assert_eq!(budget.try_consume(), Some(2));
        assert_eq!(budget.try_consume(), Some(1));
        assert_eq!(budget.try_consume(), Some(0));
        assert_eq!(budget.try_consume(), None);
        assert_eq!(budget.remaining(), 0);
        assert_eq!(budget.used(), 3);
    }

    #[test]
    fn zero_budget_never_allows_a_call() {
        let budget = CallBudget::new(0);
        assert_eq!(budget.try_consume(), None);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn remaining_tracks_consumption() {
        let budget = CallBudget::new(10);
        budget.try_consume();
        budget.try_consume();
        assert_eq!(budget.remaining(), 8);
        assert_eq!(budget.limit(), 10);
    }
}
