//! Fixed-window quotas.
//!
//! A [`QuotaWindow`] answers two questions about a counter that is stored
//! elsewhere: has its window lapsed (so it starts over), and may one more
//! unit be spent.

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaWindow {
    /// Units allowed per window.
    pub limit: u32,
    /// How long after the anchor the counter starts over.
    pub window: TimeDelta,
}

/// Outcome of [`QuotaWindow::try_spend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Counter value after spending one unit.
    Granted { used: u32 },
    Exhausted,
}

impl QuotaWindow {
    pub const fn new(limit: u32, window: TimeDelta) -> Self {
        Self { limit, window }
    }

    /// Counter value to evaluate at `now`: zero once more than `window` has
    /// passed since `anchor`, otherwise unchanged.
    pub fn replenished(&self, used: u32, anchor: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        if now - anchor > self.window { 0 } else { used }
    }

    pub fn try_spend(&self, used: u32) -> QuotaDecision {
        if used >= self.limit {
            QuotaDecision::Exhausted
        } else {
            QuotaDecision::Granted { used: used + 1 }
        }
    }

    pub fn remaining(&self, used: u32) -> u32 {
        self.limit.saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_three() -> QuotaWindow {
        QuotaWindow::new(3, TimeDelta::hours(24))
    }

    #[test]
    fn spends_until_limit() {
        let quota = daily_three();
        assert_eq!(quota.try_spend(0), QuotaDecision::Granted { used: 1 });
        assert_eq!(quota.try_spend(2), QuotaDecision::Granted { used: 3 });
        assert_eq!(quota.try_spend(3), QuotaDecision::Exhausted);
        assert_eq!(quota.try_spend(7), QuotaDecision::Exhausted);
    }

    #[test]
    fn replenishes_strictly_after_window() {
        let quota = daily_three();
        let anchor = Utc::now();
        assert_eq!(quota.replenished(3, anchor, anchor + TimeDelta::hours(24)), 3);
        assert_eq!(
            quota.replenished(3, anchor, anchor + TimeDelta::hours(24) + TimeDelta::seconds(1)),
            0
        );
        // anchor in the future (token not yet expired)
        assert_eq!(quota.replenished(2, anchor, anchor - TimeDelta::minutes(10)), 2);
    }

    #[test]
    fn remaining_saturates() {
        let quota = daily_three();
        assert_eq!(quota.remaining(1), 2);
        assert_eq!(quota.remaining(5), 0);
    }
}
