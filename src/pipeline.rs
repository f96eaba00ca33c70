//! Single-pass analysis driver.
//!
//! Runs the full flow over one matrix and group assignment: normalize,
//! test, project, select. Every output is an immutable snapshot; a
//! precondition failure in any stage surfaces immediately and nothing
//! partial is returned.

use tracing::debug;

use crate::error::Result;
use crate::matrix::{ExpressionMatrix, GroupAssignment, NormalizedMatrix};
use crate::normalization;
use crate::projection::{self, ProjectionConfig, ProjectionResult};
use crate::selection;
use crate::testing::{self, DifferentialExpressionResult};

/// Configuration for one analysis pass.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Principal components to compute for the sample projection.
    pub components: usize,
    /// How many top-ranked genes to select for display.
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            components: 2,
            top_n: 25,
        }
    }
}

/// All outputs of one analysis pass.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// log2(CPM + 1) expression values, same keys as the input matrix.
    pub normalized: NormalizedMatrix,
    /// Per-gene test table, sorted by adjusted p-value.
    pub results: DifferentialExpressionResult,
    /// Sample projection with group labels and explained variance.
    pub projection: ProjectionResult,
    /// Top-ranked gene identifiers for display slicing.
    pub top_genes: Vec<String>,
}

/// Run the full pipeline: normalize, test, project, select.
///
/// The test table is computed from raw counts; only the projection
/// consumes the normalized matrix. Both read the same group assignment.
pub fn run(
    matrix: &ExpressionMatrix,
    groups: &GroupAssignment,
    config: &AnalysisConfig,
) -> Result<Analysis> {
    debug!(
        genes = matrix.n_genes(),
        samples = matrix.n_samples(),
        "starting analysis pass"
    );

    let normalized = normalization::cpm_log2(matrix)?;
    let results = testing::differential_expression(matrix, groups)?;
    let projection = projection::project(
        &normalized,
        groups,
        &ProjectionConfig {
            components: config.components,
            ..ProjectionConfig::default()
        },
    )?;
    let top_genes = selection::top_genes(&results, config.top_n);

    debug!(
        significant = results.num_significant(0.05),
        selected = top_genes.len(),
        "analysis pass complete"
    );

    Ok(Analysis {
        normalized,
        results,
        projection,
        top_genes,
    })
}
