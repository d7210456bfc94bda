//! Order-independent summation.
//!
//! Floating-point addition is not associative, so summing the same client
//! terms in a different order can change the last bit of the result. Sorting
//! the terms by total order first makes the sum a function of the multiset
//! of terms alone.

/// Sum `terms` in `f64` after sorting them in place by [`f64::total_cmp`].
pub fn ordered_sum(terms: &mut [f64]) -> f64 {
    terms.sort_unstable_by(f64::total_cmp);
    terms.iter().sum()
}
