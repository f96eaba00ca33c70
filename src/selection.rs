//! Top-N gene selection from a differential expression result table.

use crate::testing::DifferentialExpressionResult;

/// The `n` most significant genes, in table order.
///
/// The result table is already sorted (adjusted p-value ascending, ties by
/// raw p-value then gene identifier), so selection is a prefix slice; no
/// statistics are recomputed. Asking for more genes than exist returns
/// them all.
pub fn top_genes(result: &DifferentialExpressionResult, n: usize) -> Vec<String> {
    result
        .rows()
        .iter()
        .take(n)
        .map(|row| row.gene.clone())
        .collect()
}
