//! Differential expression testing between the two sample groups.
//!
//! The engine runs an independent Welch's t-test per gene (a parallel map
//! over matrix rows; each test reads one row plus the shared read-only
//! partition), joins, applies Benjamini-Hochberg correction across the
//! full p-value set, and emits the result table sorted by adjusted
//! p-value.

use ndarray::Axis;
use ndarray::parallel::prelude::*;
use serde::Serialize;
use tracing::debug;

pub mod correction;
pub mod effect;
pub mod parametric;

use crate::error::Result;
use crate::matrix::{ExpressionMatrix, GroupAssignment};

/// Pseudo-count used for the log2 fold change, matching log2(mean + 1).
const FOLD_CHANGE_PSEUDO_COUNT: f64 = 1.0;

/// Per-gene differential expression result.
///
/// Serializes with the column names consumed by downstream tabular
/// exports: `gene, log2FoldChange, pvalue, padj`.
#[derive(Debug, Clone, Serialize)]
pub struct GeneResult {
    /// Gene identifier.
    pub gene: String,
    /// Log2 fold change of Stress over Control, from raw per-group means.
    #[serde(rename = "log2FoldChange")]
    pub log2_fold_change: f64,
    /// Welch t statistic (Stress minus Control orientation).
    pub statistic: f64,
    /// Raw two-sided p-value.
    #[serde(rename = "pvalue")]
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p-value.
    #[serde(rename = "padj")]
    pub p_adjusted: f64,
}

/// Result table of a differential expression run, one row per gene,
/// sorted ascending by adjusted p-value (ties by raw p-value, then gene
/// identifier).
#[derive(Debug, Clone)]
pub struct DifferentialExpressionResult {
    rows: Vec<GeneResult>,
}

impl DifferentialExpressionResult {
    pub fn rows(&self) -> &[GeneResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneResult> {
        self.rows.iter()
    }

    /// Row for a specific gene, if present.
    pub fn get(&self, gene: &str) -> Option<&GeneResult> {
        self.rows.iter().find(|row| row.gene == gene)
    }

    /// Genes significant at the given adjusted-p-value threshold, in
    /// table order.
    pub fn significant_genes(&self, alpha: f64) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| row.p_adjusted < alpha)
            .map(|row| row.gene.as_str())
            .collect()
    }

    /// Number of genes significant at the given threshold.
    pub fn num_significant(&self, alpha: f64) -> usize {
        self.rows.iter().filter(|row| row.p_adjusted < alpha).count()
    }
}

impl<'a> IntoIterator for &'a DifferentialExpressionResult {
    type Item = &'a GeneResult;
    type IntoIter = std::slice::Iter<'a, GeneResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Test every gene for differential expression between Stress and Control.
///
/// Preconditions are checked up front (group domain equality, at least
/// two samples per group); after that the computation never aborts, since
/// per-gene degeneracies resolve locally inside the test (see
/// [`parametric::welch_from_sums`]).
pub fn differential_expression(
    matrix: &ExpressionMatrix,
    groups: &GroupAssignment,
) -> Result<DifferentialExpressionResult> {
    let partition = groups.partition(matrix)?;

    // Parallel per-gene map; the collect is the join barrier before the
    // global correction pass.
    let tests: Vec<(f64, f64, f64)> = matrix
        .counts()
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| {
            let control: Vec<f64> = partition.control.iter().map(|&j| row[j]).collect();
            let stress: Vec<f64> = partition.stress.iter().map(|&j| row[j]).collect();
            let test = parametric::welch_t_test(&stress, &control);
            let fold_change =
                effect::log2_fold_change(&stress, &control, FOLD_CHANGE_PSEUDO_COUNT);
            (test.statistic, test.p_value, fold_change)
        })
        .collect();

    let p_values: Vec<f64> = tests.iter().map(|&(_, p, _)| p).collect();
    let adjusted = correction::benjamini_hochberg(&p_values)?;

    let mut rows: Vec<GeneResult> = matrix
        .genes()
        .iter()
        .zip(tests.iter())
        .zip(adjusted.iter())
        .map(|((gene, &(statistic, p_value, log2_fold_change)), &p_adjusted)| GeneResult {
            gene: gene.clone(),
            log2_fold_change,
            statistic,
            p_value,
            p_adjusted,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.p_adjusted
            .total_cmp(&b.p_adjusted)
            .then(a.p_value.total_cmp(&b.p_value))
            .then_with(|| a.gene.cmp(&b.gene))
    });

    debug!(
        genes = rows.len(),
        control = partition.control.len(),
        stress = partition.stress.len(),
        significant = rows.iter().filter(|r| r.p_adjusted < 0.05).count(),
        "differential expression complete"
    );

    Ok(DifferentialExpressionResult { rows })
}
