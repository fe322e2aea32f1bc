//! Lazy weight normalization and cumulative selection.
//!
//! Successor weights are never normalized when they are inserted;
//! normalization happens on every read, so intermediate partial sums
//! never need to be consistent. Both the state-level weighted selection
//! and the history-conditioned transition command go through this
//! module, keeping the two selection paths numerically identical.

/// Normalize raw weights into a probability vector.
///
/// Negative weights are treated as zero. If the sum of positive weights
/// is not positive, every entry is given probability `1/N` (the uniform
/// fallback). An empty slice yields an empty vector.
pub fn normalized_or_uniform(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }

    let positive_sum: f64 = raw.iter().map(|w| w.max(0.0)).sum();
    if positive_sum <= 0.0 {
        let p = 1.0 / raw.len() as f64;
        return vec![p; raw.len()];
    }

    raw.iter().map(|w| w.max(0.0) / positive_sum).collect()
}

/// Walk probabilities in order, returning the first index whose
/// cumulative probability reaches `draw`.
///
/// If accumulated floating error prevents any match, the last index is
/// returned.
///
/// # Panics
///
/// Panics if `probs` is empty; callers handle the no-candidate case
/// before selecting.
pub fn pick_index(probs: &[f64], draw: f64) -> usize {
    assert!(!probs.is_empty(), "cannot select from zero candidates");

    let mut cumulative = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if draw <= cumulative {
            return i;
        }
    }
    probs.len() - 1
}

/// True when every weight is non-positive, i.e. selection would take
/// the uniform fallback.
pub fn is_degenerate(raw: &[f64]) -> bool {
    !raw.is_empty() && raw.iter().map(|w| w.max(0.0)).sum::<f64>() <= 0.0
}
