use std::time::{Duration, Instant};

/// Default planning horizon when the GUI gives no `movestogo`.
const DEFAULT_MOVES_TO_GO: u64 = 30;

/// Soft and hard budgets for one `go`. The soft limit gates starting
/// another iterative-deepening round; the hard limit aborts mid-search and
/// leaves headroom for a root fail-high to keep thinking past soft.
pub struct TimeManager {
    start: Instant,
    soft: Option<Duration>,
    hard: Option<Duration>,
}

impl TimeManager {
    pub fn infinite() -> Self {
        TimeManager { start: Instant::now(), soft: None, hard: None }
    }

    /// `movetime`: one fixed budget, soft = hard.
    pub fn fixed(ms: u64) -> Self {
        let limit = Duration::from_millis(ms);
        TimeManager { start: Instant::now(), soft: Some(limit), hard: Some(limit) }
    }

    /// Split the remaining clock over the moves to the time control, plus
    /// most of the increment. A slice of the clock is held back against
    /// lag, and the hard limit caps runaway single moves.
    pub fn allocate(remaining_ms: u64, increment_ms: u64, movestogo: Option<u64>) -> Self {
        let moves_to_go = movestogo.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
        let reserve = (remaining_ms / 20).min(1000);
        let usable = remaining_ms.saturating_sub(reserve);

        let mut soft = usable / moves_to_go + increment_ms * 3 / 4;
        soft = soft.min(usable).max(1);

        let hard = (soft * 4).min(usable / 2).max(soft);

        TimeManager {
            start: Instant::now(),
            soft: Some(Duration::from_millis(soft)),
            hard: Some(Duration::from_millis(hard.max(1))),
        }
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline(always)]
    pub fn soft_exceeded(&self) -> bool {
        self.soft.is_some_and(|limit| self.start.elapsed() >= limit)
    }

    #[inline(always)]
    pub fn hard_exceeded(&self) -> bool {
        self.hard.is_some_and(|limit| self.start.elapsed() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_never_expires() {
        let tm = TimeManager::infinite();
        assert!(!tm.soft_exceeded());
        assert!(!tm.hard_exceeded());
    }

    #[test]
    fn fixed_budget_expires() {
        let tm = TimeManager::fixed(0);
        assert!(tm.soft_exceeded());
        assert!(tm.hard_exceeded());
    }

    #[test]
    fn allocation_leaves_headroom_for_fail_high() {
        let tm = TimeManager::allocate(60_000, 1_000, Some(30));
        let soft = tm.soft.unwrap();
        let hard = tm.hard.unwrap();
        assert!(hard >= soft);
        assert!(hard <= Duration::from_millis(30_000));
        // Roughly a thirtieth of the clock plus most of the increment.
        assert!(soft >= Duration::from_millis(1_900));
        assert!(soft <= Duration::from_millis(3_500));
    }

    #[test]
    fn low_clock_still_gets_a_nonzero_slice() {
        let tm = TimeManager::allocate(80, 0, None);
        assert!(tm.soft.unwrap() >= Duration::from_millis(1));
        assert!(tm.hard.unwrap() >= tm.soft.unwrap());
    }
}
