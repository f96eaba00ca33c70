//! Multiple testing correction across the per-gene p-value set.

use std::cmp::Ordering;

use crate::error::{ExpressionError, Result};

/// Apply the Benjamini-Hochberg step-up procedure for controlling the
/// false discovery rate.
///
/// P-values are ranked ascending; the raw adjusted value at rank r (of n)
/// is `p(r) * n / r`, then monotonicity is enforced by a running minimum
/// from the largest rank down, capped at 1.0. Adjusted values are returned
/// in the input's order.
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust, each in [0, 1]
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values
pub fn benjamini_hochberg(p_values: &[f64]) -> Result<Vec<f64>> {
    let n = p_values.len();
    if n == 0 {
        return Err(ExpressionError::InvalidInput("empty p-value array".into()));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(ExpressionError::InvalidInput(format!(
                "invalid p-value at index {i}: {p}"
            )));
        }
    }

    // Index-value pairs sorted ascending by p-value.
    let mut indexed: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    // Process from largest to smallest rank, carrying the running minimum.
    let mut adjusted = vec![0.0; n];
    let mut current_min = 1.0_f64;
    for i in (0..n).rev() {
        let (orig_idx, p) = indexed[i];
        let rank = i + 1;
        let adjustment = (p * n as f64 / rank as f64).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted[orig_idx] = current_min;
    }

    Ok(adjusted)
}
