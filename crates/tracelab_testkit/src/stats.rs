//! Goodness-of-fit helpers.

use tracelab_core::Action;

/// Critical chi-square value for 6 degrees of freedom at p = 0.001.
pub const CHI_SQUARE_CRITICAL_DF6: f64 = 22.458;

/// Pearson's chi-square statistic of `observed` against a uniform
/// expectation over its categories.
pub fn chi_square_uniform(observed: &[u64]) -> f64 {
    let total: u64 = observed.iter().sum();
    if observed.is_empty() || total == 0 {
        return 0.0;
    }
    let expected = total as f64 / observed.len() as f64;
    observed
        .iter()
        .map(|&o| {
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

/// Counts how often each action occurs in `draws`, indexed like
/// [`Action::ALL`].
pub fn action_frequencies(draws: impl IntoIterator<Item = Action>) -> [u64; 7] {
    let mut counts = [0u64; 7];
    for action in draws {
        counts[action.index()] += 1;
    }
    counts
}
