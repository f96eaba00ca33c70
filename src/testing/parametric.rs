//! Welch's t-test for two-sample comparisons on expression data.
//!
//! The per-gene test works from sums and sums of squares so the matrix
//! traversal only accumulates two running values per group. Degenerate
//! genes never abort the computation: a zero standard error with equal
//! means yields p = 1.0 (no evidence of difference), with unequal means
//! an infinite statistic and p = 0.0.

use num_traits::Float;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Outcome of a single two-sample test.
#[derive(Debug, Clone, Copy)]
pub struct TestResult {
    /// The t statistic. Infinite for perfectly separated zero-variance
    /// groups, 0.0 when there is no evidence of a difference.
    pub statistic: f64,
    /// Two-sided p-value in [0, 1].
    pub p_value: f64,
    /// Welch–Satterthwaite degrees of freedom, when defined.
    pub degrees_of_freedom: Option<f64>,
}

impl TestResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
        }
    }

    pub fn with_degrees_of_freedom(mut self, df: f64) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Check if the result is statistically significant at the given threshold.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Welch's unequal-variance t-test of `x` against `y`, two-sided.
///
/// The statistic is oriented as `mean(x) − mean(y)`. Groups with fewer
/// than two observations cannot support a variance estimate and return
/// the no-evidence result (t = 0, p = 1).
pub fn welch_t_test<T>(x: &[T], y: &[T]) -> TestResult
where
    T: Float,
{
    if x.len() < 2 || y.len() < 2 {
        return TestResult::new(0.0, 1.0);
    }

    let mut sum_x = T::zero();
    let mut sum_sq_x = T::zero();
    for &val in x {
        sum_x = sum_x + val;
        sum_sq_x = sum_sq_x + val * val;
    }

    let mut sum_y = T::zero();
    let mut sum_sq_y = T::zero();
    for &val in y {
        sum_y = sum_y + val;
        sum_sq_y = sum_sq_y + val * val;
    }

    welch_from_sums(
        sum_x.to_f64().unwrap(),
        sum_sq_x.to_f64().unwrap(),
        x.len() as f64,
        sum_y.to_f64().unwrap(),
        sum_sq_y.to_f64().unwrap(),
        y.len() as f64,
    )
}

/// Welch's t-test from precomputed summary statistics.
///
/// `sum1`, `sum_sq1`, `n1` describe the first group; the statistic is
/// oriented as `mean1 − mean2`.
pub fn welch_from_sums(
    sum1: f64,
    sum_sq1: f64,
    n1: f64,
    sum2: f64,
    sum_sq2: f64,
    n2: f64,
) -> TestResult {
    if n1 < 2.0 || n2 < 2.0 {
        return TestResult::new(0.0, 1.0);
    }

    let mean1 = sum1 / n1;
    let mean2 = sum2 / n2;

    // Computational formula; the max(0) guards against tiny negative
    // values from floating-point cancellation.
    let var1 = ((sum_sq1 - sum1 * sum1 / n1) / (n1 - 1.0)).max(0.0);
    let var2 = ((sum_sq2 - sum2 * sum2 / n2) / (n2 - 1.0)).max(0.0);

    let mean_diff = mean1 - mean2;
    let term1 = var1 / n1;
    let term2 = var2 / n2;
    let combined_var = term1 + term2;

    if combined_var == 0.0 {
        // Both groups constant: equal means are no evidence at all,
        // unequal means are perfect separation.
        return if mean_diff == 0.0 {
            TestResult::new(0.0, 1.0)
        } else {
            TestResult::new(mean_diff.signum() * f64::INFINITY, 0.0)
        };
    }

    let t_stat = mean_diff / combined_var.sqrt();

    // Welch–Satterthwaite equation
    let df = combined_var * combined_var
        / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));

    TestResult::new(t_stat, two_sided_p_value(t_stat, df)).with_degrees_of_freedom(df)
}

/// Two-sided p-value from the Student-t survival function at |t|.
fn two_sided_p_value(t_stat: f64, df: f64) -> f64 {
    if !t_stat.is_finite() {
        return if t_stat.is_infinite() { 0.0 } else { 1.0 };
    }
    if df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * (1.0 - t_dist.cdf(t_stat.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn detects_clear_separation() {
        // [1,2,3] vs [7,8,9]: means 2 and 8, both variances 1,
        // t = -6 / sqrt(2/3) ≈ -7.348, df = 4 by Welch–Satterthwaite.
        let result = welch_t_test(&[1.0, 2.0, 3.0], &[7.0, 8.0, 9.0]);
        assert_relative_eq!(result.statistic, -7.348469228349534, epsilon = 1e-9);
        assert_relative_eq!(result.degrees_of_freedom.unwrap(), 4.0, epsilon = 1e-9);
        assert!(result.p_value < 0.01, "p={}", result.p_value);
        assert!(result.is_significant(0.05));
    }

    #[test]
    fn identical_groups_show_no_evidence() {
        let result = welch_t_test(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn zero_variance_with_shifted_means_is_perfect_separation() {
        let result = welch_t_test(&[60.0, 60.0], &[20.0, 20.0]);
        assert!(result.statistic.is_infinite() && result.statistic > 0.0);
        assert_eq!(result.p_value, 0.0);

        let flipped = welch_t_test(&[20.0, 20.0], &[60.0, 60.0]);
        assert!(flipped.statistic.is_infinite() && flipped.statistic < 0.0);
        assert_eq!(flipped.p_value, 0.0);
    }

    #[test]
    fn same_means_high_variance_not_significant() {
        let result = welch_t_test(&[1.0, 10.0, 2.0, 9.0, 3.0], &[2.0, 8.0, 4.0, 7.0, 4.0]);
        assert!(result.p_value > 0.1, "p={}", result.p_value);
        assert!(result.statistic.abs() < 1.0);
    }

    #[test]
    fn undersized_group_returns_no_evidence() {
        let result = welch_t_test(&[1.0], &[7.0, 8.0, 9.0]);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn unequal_sample_sizes() {
        let small = [7.0, 7.5, 6.5];
        let large = [5.0, 5.2, 4.8, 5.1, 4.9, 5.0, 5.3, 4.7, 5.1, 4.9];
        let result = welch_t_test(&small, &large);
        assert!(result.p_value < 0.05, "p={}", result.p_value);
        assert!(result.statistic > 0.0);
    }

    #[test]
    fn slice_and_sums_paths_agree() {
        let x = [3.0, 4.0, 5.0, 4.5];
        let y = [6.0, 7.0, 6.5];
        let from_slices = welch_t_test(&x, &y);
        let from_sums = welch_from_sums(
            x.iter().sum(),
            x.iter().map(|v| v * v).sum(),
            x.len() as f64,
            y.iter().sum(),
            y.iter().map(|v| v * v).sum(),
            y.len() as f64,
        );
        assert_relative_eq!(from_slices.statistic, from_sums.statistic, epsilon = 1e-12);
        assert_relative_eq!(from_slices.p_value, from_sums.p_value, epsilon = 1e-12);
    }

    #[test]
    fn welch_satterthwaite_df_hand_checked() {
        // x: var 4, n 4; y: var 1, n 5
        // term1 = 1.0, term2 = 0.2
        // df = 1.44 / (1/3 + 0.04/4) = 1.44 / 0.343333... ≈ 4.1942
        let result = welch_from_sums(0.0, 12.0, 4.0, 0.0, 4.0, 5.0);
        assert_relative_eq!(
            result.degrees_of_freedom.unwrap(),
            1.44 / (1.0 / 3.0 + 0.01),
            epsilon = 1e-9
        );
    }
}
