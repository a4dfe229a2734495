//! Search scheduler
//!
//! The candidate space is the Cartesian product
//! `passphrase × iterations × hash × salt`, passphrase outermost. It is
//! flattened to `0..len` and decoded by index arithmetic, so "first match"
//! always means "lowest index", whether the scan is sequential or runs on
//! the rayon pool.

use std::ops::ControlFlow;

use rayon::prelude::*;

use crate::budget::{BudgetClock, StopReason};

/// Indices into the four candidate lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub passphrase: usize,
    pub iterations: usize,
    pub hash: usize,
    pub salt: usize,
}

/// Dimensions of the candidate product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSpace {
    passphrases: usize,
    iterations: usize,
    hashes: usize,
    salts: usize,
}

impl ProductSpace {
    pub fn new(passphrases: usize, iterations: usize, hashes: usize, salts: usize) -> Self {
        Self {
            passphrases,
            iterations,
            hashes,
            salts,
        }
    }

    pub fn len(&self) -> usize {
        self.passphrases
            .saturating_mul(self.iterations)
            .saturating_mul(self.hashes)
            .saturating_mul(self.salts)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a flat index. `index` must be below `len()`.
    pub fn leaf(&self, index: usize) -> Leaf {
        let salt = index % self.salts;
        let rest = index / self.salts;
        let hash = rest % self.hashes;
        let rest = rest / self.hashes;
        let iterations = rest % self.iterations;
        let passphrase = rest / self.iterations;
        Leaf {
            passphrase,
            iterations,
            hash,
            salt,
        }
    }
}

/// How a pass over a candidate list ended
#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    Found(T),
    SpaceExhausted,
    Stopped(StopReason),
}

/// Indices handed to the pool per budget reservation, per worker thread.
const BLOCK_PER_THREAD: usize = 16;

/// Try candidates `0..count` in order and return the first accepted one.
///
/// `attempt` turns any per-candidate failure into `None`. The budget is
/// checked before each attempt. In parallel mode the lowest accepted index
/// still wins.
pub fn first_match<T, F>(
    count: usize,
    clock: &BudgetClock,
    parallel: bool,
    attempt: F,
) -> SearchOutcome<T>
where
    T: Send,
    F: Fn(usize) -> Option<T> + Sync + Send,
{
    if parallel {
        return first_match_parallel(count, clock, attempt);
    }

    let flow = (0..count).try_for_each(|index| {
        if let Err(reason) = clock.begin_attempt() {
            return ControlFlow::Break(SearchOutcome::Stopped(reason));
        }
        match attempt(index) {
            Some(value) => ControlFlow::Break(SearchOutcome::Found(value)),
            None => ControlFlow::Continue(()),
        }
    });

    match flow {
        ControlFlow::Break(outcome) => outcome,
        ControlFlow::Continue(()) => SearchOutcome::SpaceExhausted,
    }
}

/// Blocks are reserved from the budget in enumeration order, so the indices
/// tried are always a prefix of `0..count`, the same prefix a sequential
/// scan would try. Inside a block the lowest index that either matched or
/// hit the deadline decides the outcome.
fn first_match_parallel<T, F>(count: usize, clock: &BudgetClock, attempt: F) -> SearchOutcome<T>
where
    T: Send,
    F: Fn(usize) -> Option<T> + Sync + Send,
{
    let block = rayon::current_num_threads().max(1) * BLOCK_PER_THREAD;
    let mut start = 0;

    while start < count {
        let wanted = block.min(count - start);
        let granted = match clock.reserve(wanted as u64) {
            Ok(granted) => granted as usize,
            Err(reason) => return SearchOutcome::Stopped(reason),
        };

        let decided = (start..start + granted)
            .into_par_iter()
            .find_map_first(|index| match clock.check() {
                Ok(()) => attempt(index).map(Ok),
                Err(reason) => Some(Err(reason)),
            });
        match decided {
            Some(Ok(value)) => return SearchOutcome::Found(value),
            Some(Err(reason)) => return SearchOutcome::Stopped(reason),
            None => start += granted,
        }
    }

    SearchOutcome::SpaceExhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::SearchBudget;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn clock(max_attempts: u64) -> BudgetClock {
        BudgetClock::start(
            SearchBudget {
                max_duration: Duration::from_secs(60),
                max_attempts,
            },
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_leaf_decoding_is_passphrase_major() {
        let space = ProductSpace::new(2, 3, 2, 4);
        assert_eq!(space.len(), 48);
        assert_eq!(
            space.leaf(0),
            Leaf { passphrase: 0, iterations: 0, hash: 0, salt: 0 }
        );
        assert_eq!(
            space.leaf(1),
            Leaf { passphrase: 0, iterations: 0, hash: 0, salt: 1 }
        );
        assert_eq!(
            space.leaf(4),
            Leaf { passphrase: 0, iterations: 0, hash: 1, salt: 0 }
        );
        assert_eq!(
            space.leaf(8),
            Leaf { passphrase: 0, iterations: 1, hash: 0, salt: 0 }
        );
        assert_eq!(
            space.leaf(24),
            Leaf { passphrase: 1, iterations: 0, hash: 0, salt: 0 }
        );
        assert_eq!(
            space.leaf(47),
            Leaf { passphrase: 1, iterations: 2, hash: 1, salt: 3 }
        );
    }

    #[test]
    fn test_empty_dimension_empties_space() {
        assert!(ProductSpace::new(3, 0, 2, 36).is_empty());
    }

    #[test]
    fn test_first_match_reports_lowest_index() {
        let winners = [17usize, 5, 40];
        let outcome = first_match(64, &clock(1000), false, |i| {
            winners.contains(&i).then_some(i)
        });
        assert_eq!(outcome, SearchOutcome::Found(5));
    }

    #[test]
    fn test_parallel_reports_lowest_index() {
        let winners = [900usize, 31, 32, 600];
        for _ in 0..20 {
            let outcome = first_match(1000, &clock(10_000), true, |i| {
                winners.contains(&i).then_some(i)
            });
            assert_eq!(outcome, SearchOutcome::Found(31));
        }
    }

    #[test]
    fn test_parallel_tight_budget_matches_sequential() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();
        let winners = [5usize, 900];
        let hit = |i: usize| winners.contains(&i).then_some(i);

        let sequential = first_match(1000, &clock(10), false, hit);
        assert_eq!(sequential, SearchOutcome::Found(5));
        for _ in 0..50 {
            let parallel = pool.install(|| first_match(1000, &clock(10), true, hit));
            assert_eq!(parallel, sequential);
        }
    }

    #[test]
    fn test_parallel_match_past_budget_is_stopped() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();
        let winners = [12usize, 900];
        let hit = |i: usize| winners.contains(&i).then_some(i);

        assert_eq!(
            first_match(1000, &clock(10), false, hit),
            SearchOutcome::Stopped(StopReason::AttemptLimit)
        );
        for _ in 0..50 {
            let parallel = pool.install(|| first_match(1000, &clock(10), true, hit));
            assert_eq!(parallel, SearchOutcome::Stopped(StopReason::AttemptLimit));
        }
    }

    #[test]
    fn test_parallel_budget_spans_several_blocks() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let clock = clock(100);
        let outcome = pool.install(|| {
            first_match(1000, &clock, true, |i| (i == 99).then_some(i))
        });
        assert_eq!(outcome, SearchOutcome::Found(99));
        assert_eq!(clock.attempts(), 100);
    }

    #[test]
    fn test_parallel_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let clock = BudgetClock::start(
            SearchBudget {
                max_duration: Duration::from_secs(60),
                max_attempts: 100,
            },
            cancel,
        );
        let outcome: SearchOutcome<()> = first_match(5, &clock, true, |_| None);
        assert_eq!(outcome, SearchOutcome::Stopped(StopReason::Cancelled));
        assert_eq!(clock.attempts(), 0);
    }

    #[test]
    fn test_stops_after_first_match() {
        let calls = AtomicUsize::new(0);
        let outcome = first_match(100, &clock(1000), false, |i| {
            calls.fetch_add(1, Ordering::SeqCst);
            (i == 9).then_some(i)
        });
        assert_eq!(outcome, SearchOutcome::Found(9));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_attempt_budget_respected() {
        let calls = AtomicUsize::new(0);
        let clock = clock(7);
        let outcome: SearchOutcome<()> = first_match(100, &clock, false, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        });
        assert_eq!(outcome, SearchOutcome::Stopped(StopReason::AttemptLimit));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert_eq!(clock.attempts(), 7);
    }

    #[test]
    fn test_parallel_attempt_budget_respected() {
        let calls = AtomicUsize::new(0);
        let clock = clock(7);
        let outcome: SearchOutcome<()> = first_match(100, &clock, true, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        });
        assert_eq!(outcome, SearchOutcome::Stopped(StopReason::AttemptLimit));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_space_exhausted() {
        let outcome: SearchOutcome<()> = first_match(5, &clock(1000), false, |_| None);
        assert_eq!(outcome, SearchOutcome::SpaceExhausted);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let clock = BudgetClock::start(
            SearchBudget {
                max_duration: Duration::from_secs(60),
                max_attempts: 100,
            },
            cancel,
        );
        let outcome: SearchOutcome<()> = first_match(5, &clock, false, |_| None);
        assert_eq!(outcome, SearchOutcome::Stopped(StopReason::Cancelled));
        assert_eq!(clock.attempts(), 0);
    }
}
