//! Core data model: count matrices, normalized matrices, and group labels.
//!
//! Matrices are stored dense (genes × samples) with parallel identifier
//! arrays and identifier→position lookup maps. Row and column order is
//! insertion order and is preserved by every operation in the crate.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::Serialize;

use crate::error::{ExpressionError, Result};

/// Condition label for a sample. Exactly two groups are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Group {
    Control,
    Stress,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::Control => write!(f, "Control"),
            Group::Stress => write!(f, "Stress"),
        }
    }
}

fn build_lookup(ids: &[String], kind: &str) -> Result<HashMap<String, usize>> {
    let mut lookup = HashMap::with_capacity(ids.len());
    for (pos, id) in ids.iter().enumerate() {
        if lookup.insert(id.clone(), pos).is_some() {
            return Err(ExpressionError::InvalidInput(format!(
                "duplicate {kind} identifier '{id}'"
            )));
        }
    }
    Ok(lookup)
}

fn check_counts(values: &ArrayView2<f64>) -> Result<()> {
    for &v in values.iter() {
        if !v.is_finite() {
            return Err(ExpressionError::InvalidInput(format!(
                "non-finite count value {v}"
            )));
        }
        if v < 0.0 {
            return Err(ExpressionError::InvalidInput(format!(
                "negative count value {v}"
            )));
        }
    }
    Ok(())
}

/// A dense genes × samples matrix of raw, non-negative counts.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    counts: Array2<f64>,
    gene_lookup: HashMap<String, usize>,
    sample_lookup: HashMap<String, usize>,
}

impl ExpressionMatrix {
    /// Build a matrix from identifier arrays and a pre-shaped count array.
    ///
    /// Validates shape agreement, identifier uniqueness, and that every
    /// count is finite and non-negative.
    pub fn new(genes: Vec<String>, samples: Vec<String>, counts: Array2<f64>) -> Result<Self> {
        if genes.is_empty() || samples.is_empty() {
            return Err(ExpressionError::InvalidInput(
                "matrix must have at least one gene and one sample".into(),
            ));
        }
        if counts.nrows() != genes.len() || counts.ncols() != samples.len() {
            return Err(ExpressionError::InvalidInput(format!(
                "count array is {}×{} but {} genes and {} samples were given",
                counts.nrows(),
                counts.ncols(),
                genes.len(),
                samples.len(),
            )));
        }
        check_counts(&counts.view())?;
        let gene_lookup = build_lookup(&genes, "gene")?;
        let sample_lookup = build_lookup(&samples, "sample")?;
        Ok(ExpressionMatrix {
            genes,
            samples,
            counts,
            gene_lookup,
            sample_lookup,
        })
    }

    /// Build a matrix from per-gene rows, rejecting ragged input.
    pub fn from_rows(
        genes: Vec<String>,
        samples: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if rows.len() != genes.len() {
            return Err(ExpressionError::InvalidInput(format!(
                "{} rows given for {} genes",
                rows.len(),
                genes.len(),
            )));
        }
        let n_samples = samples.len();
        let mut flat = Vec::with_capacity(genes.len() * n_samples);
        for (gene, row) in genes.iter().zip(rows.iter()) {
            if row.len() != n_samples {
                return Err(ExpressionError::InvalidInput(format!(
                    "ragged row for gene '{gene}': {} values for {n_samples} samples",
                    row.len(),
                )));
            }
            flat.extend_from_slice(row);
        }
        let counts = Array2::from_shape_vec((genes.len(), n_samples), flat)
            .map_err(|e| ExpressionError::InvalidInput(e.to_string()))?;
        Self::new(genes, samples, counts)
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn counts(&self) -> ArrayView2<'_, f64> {
        self.counts.view()
    }

    /// Row view for one gene, in stored order.
    pub fn row(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.counts.row(gene_idx)
    }

    pub fn gene_position(&self, gene: &str) -> Option<usize> {
        self.gene_lookup.get(gene).copied()
    }

    pub fn sample_position(&self, sample: &str) -> Option<usize> {
        self.sample_lookup.get(sample).copied()
    }
}

/// Same shape and keys as [`ExpressionMatrix`], values log2(CPM + 1).
#[derive(Debug, Clone)]
pub struct NormalizedMatrix {
    genes: Vec<String>,
    samples: Vec<String>,
    values: Array2<f64>,
    gene_lookup: HashMap<String, usize>,
}

impl NormalizedMatrix {
    /// Build a normalized matrix directly from pre-computed values.
    ///
    /// Values must be finite and non-negative; normally this type is produced
    /// by [`crate::normalization::cpm_log2`].
    pub fn new(genes: Vec<String>, samples: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if genes.is_empty() || samples.is_empty() {
            return Err(ExpressionError::InvalidInput(
                "matrix must have at least one gene and one sample".into(),
            ));
        }
        if values.nrows() != genes.len() || values.ncols() != samples.len() {
            return Err(ExpressionError::InvalidInput(format!(
                "value array is {}×{} but {} genes and {} samples were given",
                values.nrows(),
                values.ncols(),
                genes.len(),
                samples.len(),
            )));
        }
        check_counts(&values.view())?;
        let gene_lookup = build_lookup(&genes, "gene")?;
        build_lookup(&samples, "sample")?;
        Ok(NormalizedMatrix {
            genes,
            samples,
            values,
            gene_lookup,
        })
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn row(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(gene_idx)
    }

    /// Select the given genes, in request order, as a new matrix.
    ///
    /// Used downstream to slice out the top-ranked genes for display.
    pub fn subset(&self, genes: &[String]) -> Result<NormalizedMatrix> {
        let mut values = Array2::zeros((genes.len(), self.samples.len()));
        for (out_idx, gene) in genes.iter().enumerate() {
            let src_idx = self.gene_lookup.get(gene).copied().ok_or_else(|| {
                ExpressionError::InvalidInput(format!("unknown gene identifier '{gene}'"))
            })?;
            values
                .row_mut(out_idx)
                .assign(&self.values.index_axis(Axis(0), src_idx));
        }
        NormalizedMatrix::new(genes.to_vec(), self.samples.clone(), values)
    }
}

/// Column index lists for the two groups of an [`ExpressionMatrix`].
#[derive(Debug, Clone)]
pub struct GroupPartition {
    pub control: Vec<usize>,
    pub stress: Vec<usize>,
}

/// Mapping from sample identifier to condition label.
#[derive(Debug, Clone, Default)]
pub struct GroupAssignment {
    labels: HashMap<String, Group>,
}

impl GroupAssignment {
    /// Build an assignment from explicit (sample, label) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Group)>,
        S: Into<String>,
    {
        GroupAssignment {
            labels: pairs
                .into_iter()
                .map(|(sample, group)| (sample.into(), group))
                .collect(),
        }
    }

    /// Infer labels from sample names: identifiers starting with `ctrl`
    /// (case-insensitive) are Control, everything else is Stress.
    pub fn infer(samples: &[String]) -> Self {
        GroupAssignment {
            labels: samples
                .iter()
                .map(|sample| {
                    let group = if sample.to_lowercase().starts_with("ctrl") {
                        Group::Control
                    } else {
                        Group::Stress
                    };
                    (sample.clone(), group)
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, sample: &str) -> Option<Group> {
        self.labels.get(sample).copied()
    }

    /// Label for a sample, or `InvalidInput` when none is assigned.
    pub fn label_for(&self, sample: &str) -> Result<Group> {
        self.get(sample).ok_or_else(|| {
            ExpressionError::InvalidInput(format!("sample '{sample}' has no group label"))
        })
    }

    /// Split the matrix's columns into control and stress index lists.
    ///
    /// The assignment's domain must equal the matrix's sample set exactly,
    /// and each label needs at least two samples for variance estimation.
    pub fn partition(&self, matrix: &ExpressionMatrix) -> Result<GroupPartition> {
        if self.labels.len() != matrix.n_samples() {
            return Err(ExpressionError::InvalidInput(format!(
                "group assignment covers {} samples but the matrix has {}",
                self.labels.len(),
                matrix.n_samples(),
            )));
        }
        let mut control = Vec::new();
        let mut stress = Vec::new();
        for (col, sample) in matrix.samples().iter().enumerate() {
            match self.label_for(sample)? {
                Group::Control => control.push(col),
                Group::Stress => stress.push(col),
            }
        }
        if control.len() < 2 || stress.len() < 2 {
            return Err(ExpressionError::DegenerateGroup(format!(
                "each group needs at least 2 samples, got {} Control and {} Stress",
                control.len(),
                stress.len(),
            )));
        }
        Ok(GroupPartition { control, stress })
    }
}
