//! Norm computations for vectors.
//!
//! Accumulates in `f64` so norms of large parameter vectors stay accurate.

/// Compute the L2 (Euclidean) norm of an f32 slice.
pub fn l2_norm(v: &[f32]) -> f32 {
    l2_norm_sq(v).sqrt() as f32
}

/// Compute the squared L2 norm of an f32 slice (avoids sqrt).
pub fn l2_norm_sq(v: &[f32]) -> f64 {
    v.iter().map(|&x| (x as f64) * (x as f64)).sum()
}

/// Euclidean distance between two equal-length slices.
///
/// Only the common prefix is compared; callers check lengths first.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}
