use std::time::Instant;

/// Number of visited nodes between two consecutive checks of the clock.
pub const TIMEOUT_POLL_INTERVAL: u64 = 1 << 12;

/// Search statistic collector.
/// It collects data during IDA* search.
pub trait SearchStatsCollector {
    /// Called for each leaf (pruned or goal) node visited, can return false to cancel search process.
    #[inline(always)] fn leaf(&mut self) -> bool { true }

    /// Called for each expanded node, can return false to cancel search process.
    #[inline(always)] fn internal(&mut self) -> bool { true }
}

/// Counts nodes and cancels the search when the deadline passes.
#[derive(Default, Copy, Clone, Debug)]
pub struct SearchStats {
    pub internal: u64,
    pub leaves: u64,
    deadline: Option<Instant>,
    next_poll: u64,
    timed_out: bool
}

impl SearchStats {
    /// Returns collector that cancels the search after `deadline` (if given).
    pub fn with_deadline(deadline: Option<Instant>) -> Self {
        Self { deadline, next_poll: TIMEOUT_POLL_INTERVAL, ..Default::default() }
    }

    pub fn visits(&self) -> u64 { self.internal + self.leaves }

    #[inline] fn poll(&mut self) -> bool {
        if self.timed_out { return false; }
        let visits = self.visits();
        if visits >= self.next_poll {
            self.next_poll = visits + TIMEOUT_POLL_INTERVAL;
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline { self.timed_out = true; return false; }
            }
        }
        true
    }
}

impl SearchStatsCollector for SearchStats {
    #[inline(always)] fn leaf(&mut self) -> bool { self.leaves += 1; self.poll() }
    #[inline(always)] fn internal(&mut self) -> bool { self.internal += 1; self.poll() }
}

/// Cancels the search after given number of visits.
pub struct Limited {
    pub visits: u64,
    pub limit: u64
}

impl Limited {
    pub fn with_limit(limit: u64) -> Self { Self{ visits: 0, limit } }

    /// Whether the search has been cancelled because of the limit.
    pub fn saturated(&self) -> bool { self.visits > self.limit }
}

impl SearchStatsCollector for Limited {
    #[inline(always)] fn leaf(&mut self) -> bool { self.visits += 1; !self.saturated() }
    #[inline(always)] fn internal(&mut self) -> bool { self.visits += 1; !self.saturated() }
}
