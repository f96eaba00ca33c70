//! Read-depth normalization: counts per million with a log2 transform.
//!
//! `normalized[i, j] = log2(counts[i, j] / library_size[j] * 1e6 + 1)`
//!
//! The normalized matrix feeds the sample projection and display slicing;
//! the differential expression tests consume raw counts directly.

use ndarray::{Array1, Axis};
use tracing::debug;

use crate::error::{ExpressionError, Result};
use crate::matrix::{ExpressionMatrix, NormalizedMatrix};

const SCALE: f64 = 1e6;

/// Per-sample total counts (library sizes), in column order.
pub fn library_sizes(matrix: &ExpressionMatrix) -> Array1<f64> {
    matrix.counts().sum_axis(Axis(0))
}

/// Normalize a count matrix to log2(CPM + 1).
///
/// Pure function of its input. Fails with
/// [`ExpressionError::DegenerateSample`] if any sample's total count is
/// zero, since the CPM division is undefined there.
pub fn cpm_log2(matrix: &ExpressionMatrix) -> Result<NormalizedMatrix> {
    let sizes = library_sizes(matrix);
    for (col, &total) in sizes.iter().enumerate() {
        if total == 0.0 {
            return Err(ExpressionError::DegenerateSample {
                sample: matrix.samples()[col].clone(),
            });
        }
    }

    let mut values = matrix.counts().to_owned();
    for (mut column, &total) in values.axis_iter_mut(Axis(1)).zip(sizes.iter()) {
        column.mapv_inplace(|v| (v / total * SCALE + 1.0).log2());
    }

    debug!(
        genes = matrix.n_genes(),
        samples = matrix.n_samples(),
        "normalized counts to log2(CPM + 1)"
    );

    NormalizedMatrix::new(
        matrix.genes().to_vec(),
        matrix.samples().to_vec(),
        values,
    )
}
