//! Per-trial execution ordering.
//!
//! Ordering is randomized so systematic drift (thermal throttling,
//! background OS activity) spreads evenly across browsers and benchmarks
//! instead of always penalizing whichever runs last. The randomization is
//! only visible in execution sequencing, never in output column order.

use rand::seq::SliceRandom;
use rand::Rng;

/// Execution order for one trial, as indices into the configured
/// benchmark and browser sets.
#[derive(Debug)]
pub struct TrialPlan {
    pub benchmarks: Vec<usize>,
    /// One independently shuffled browser order per planned benchmark,
    /// parallel to `benchmarks`.
    pub browsers: Vec<Vec<usize>>,
}

impl TrialPlan {
    /// Compute a fresh plan. Nothing is persisted; the order is
    /// recomputed for every trial.
    pub fn shuffle<R: Rng>(rng: &mut R, benchmark_count: usize, browser_count: usize) -> Self {
        let mut benchmarks: Vec<usize> = (0..benchmark_count).collect();
        benchmarks.shuffle(rng);
        let browsers = benchmarks
            .iter()
            .map(|_| {
                let mut order: Vec<usize> = (0..browser_count).collect();
                order.shuffle(rng);
                order
            })
            .collect();
        Self { benchmarks, browsers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_permutation(order: &[usize], len: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..len).collect::<Vec<_>>()
    }

    #[test]
    fn test_plan_is_a_permutation_of_both_axes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let plan = TrialPlan::shuffle(&mut rng, 5, 3);
            assert!(is_permutation(&plan.benchmarks, 5));
            assert_eq!(plan.browsers.len(), 5);
            for order in &plan.browsers {
                assert!(is_permutation(order, 3));
            }
        }
    }

    #[test]
    fn test_browser_orders_are_independent_per_benchmark() {
        // With 20 benchmarks of 5 browsers each, identical orders across
        // the board would be astronomically unlikely.
        let mut rng = StdRng::seed_from_u64(11);
        let plan = TrialPlan::shuffle(&mut rng, 20, 5);
        let all_same = plan.browsers.iter().all(|o| *o == plan.browsers[0]);
        assert!(!all_same);
    }

    #[test]
    fn test_empty_sets() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = TrialPlan::shuffle(&mut rng, 0, 0);
        assert!(plan.benchmarks.is_empty());
        assert!(plan.browsers.is_empty());
    }
}
