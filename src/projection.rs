//! Principal component projection of samples in gene-feature space.
//!
//! Each sample column of the normalized matrix is one observation; every
//! gene is mean-centered across samples and the top-k components come
//! from power iteration with deflation on the samples × samples Gram
//! matrix of the centered data. With genes far outnumbering samples the
//! Gram matrix is the small side of the decomposition, and its non-zero
//! eigenvalues equal those of the gene-space covariance up to the common
//! 1/(n−1) factor, which cancels in the variance ratios.

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use tracing::debug;

use crate::error::{ExpressionError, Result};
use crate::matrix::{Group, GroupAssignment, NormalizedMatrix};

/// Configuration for the projection.
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Number of principal components to compute.
    pub components: usize,
    /// Maximum iterations for power iteration per component.
    pub max_iter: usize,
    /// Convergence tolerance for the eigenvector.
    pub tolerance: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            components: 2,
            max_iter: 1000,
            tolerance: 1e-10,
        }
    }
}

/// One sample's position in the projected space, with its group label.
#[derive(Debug, Clone, Serialize)]
pub struct SampleCoordinates {
    pub sample: String,
    /// PC1..PCk scores.
    pub coordinates: Vec<f64>,
    pub group: Group,
}

/// Projection of all samples plus the per-component explained variance.
#[derive(Debug, Clone)]
pub struct ProjectionResult {
    samples: Vec<SampleCoordinates>,
    explained_variance_ratio: Vec<f64>,
}

impl ProjectionResult {
    pub fn samples(&self) -> &[SampleCoordinates] {
        &self.samples
    }

    /// Fraction of total variance captured by each component, descending.
    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    pub fn components(&self) -> usize {
        self.explained_variance_ratio.len()
    }
}

/// Project samples onto their top-k principal components.
///
/// Requires `1 ≤ k ≤ min(samples − 1, genes)`; mean-centering removes one
/// degree of freedom, so the centered data cannot have more than
/// `samples − 1` informative axes.
pub fn project(
    normalized: &NormalizedMatrix,
    groups: &GroupAssignment,
    config: &ProjectionConfig,
) -> Result<ProjectionResult> {
    let n_samples = normalized.n_samples();
    let n_genes = normalized.n_genes();
    let k = config.components;
    let limit = (n_samples - 1).min(n_genes);
    if k == 0 || k > limit {
        return Err(ExpressionError::InvalidDimension {
            requested: k,
            limit,
        });
    }

    // Every sample needs a label before any numeric work.
    let labels: Vec<Group> = normalized
        .samples()
        .iter()
        .map(|sample| groups.label_for(sample))
        .collect::<Result<_>>()?;

    // Mean-center each gene across samples.
    let mut centered = normalized.values().to_owned();
    for mut row in centered.axis_iter_mut(Axis(0)) {
        let mean = row.sum() / n_samples as f64;
        row.mapv_inplace(|v| v - mean);
    }

    // Gram matrix over samples; its trace is the total variance of the
    // full decomposition (up to the 1/(n-1) factor shared with the
    // eigenvalues).
    let gram = centered.t().dot(&centered);
    let total_variance = gram.diag().sum();

    let mut deflated = gram;
    let mut scores = Array2::zeros((n_samples, k));
    let mut ratios = Vec::with_capacity(k);
    for component in 0..k {
        let (eigenvalue, eigenvector) =
            power_iteration(&deflated, config.max_iter, config.tolerance);
        let sigma = eigenvalue.sqrt();
        for j in 0..n_samples {
            scores[[j, component]] = sigma * eigenvector[j];
        }
        ratios.push(if total_variance > 0.0 {
            (eigenvalue / total_variance).clamp(0.0, 1.0)
        } else {
            0.0
        });

        // Deflate: G = G - lambda * v * v^T
        for i in 0..n_samples {
            for j in 0..n_samples {
                deflated[[i, j]] -= eigenvalue * eigenvector[i] * eigenvector[j];
            }
        }
    }

    let samples = normalized
        .samples()
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(j, (sample, group))| SampleCoordinates {
            sample: sample.clone(),
            coordinates: scores.row(j).to_vec(),
            group,
        })
        .collect();

    debug!(
        samples = n_samples,
        components = k,
        captured = ratios.iter().sum::<f64>(),
        "projected samples onto principal components"
    );

    Ok(ProjectionResult {
        samples,
        explained_variance_ratio: ratios,
    })
}

/// Dominant eigenpair of a symmetric positive semi-definite matrix.
fn power_iteration(matrix: &Array2<f64>, max_iter: usize, tolerance: f64) -> (f64, Array1<f64>) {
    let n = matrix.nrows();

    // Deterministic non-zero init, normalized.
    let mut v = Array1::from_iter((0..n).map(|i| 1.0 / (i + 1) as f64));
    let norm = v.dot(&v).sqrt();
    v.mapv_inplace(|x| x / norm);

    let mut eigenvalue = 0.0;
    for _ in 0..max_iter {
        let mut w = matrix.dot(&v);
        let new_eigenvalue = v.dot(&w);

        let w_norm = w.dot(&w).sqrt();
        if w_norm == 0.0 {
            break;
        }
        w.mapv_inplace(|x| x / w_norm);

        let diff = (&w - &v).mapv(|x| x * x).sum().sqrt();
        v = w;
        eigenvalue = new_eigenvalue;
        if diff < tolerance {
            break;
        }
    }

    (eigenvalue.max(0.0), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ExpressionMatrix;
    use crate::normalization::cpm_log2;
    use ndarray::array;

    fn two_cluster_normalized() -> NormalizedMatrix {
        // Two tight sample clusters: Ctrl columns high on the first half
        // of genes, Stress columns high on the second half.
        let matrix = ExpressionMatrix::from_rows(
            (1..=6).map(|i| format!("Gene_{i:03}")).collect(),
            vec![
                "Ctrl_1".into(),
                "Ctrl_2".into(),
                "Ctrl_3".into(),
                "Stress_1".into(),
                "Stress_2".into(),
                "Stress_3".into(),
            ],
            vec![
                vec![90.0, 95.0, 92.0, 10.0, 12.0, 11.0],
                vec![80.0, 85.0, 82.0, 15.0, 14.0, 16.0],
                vec![95.0, 91.0, 94.0, 12.0, 10.0, 13.0],
                vec![10.0, 12.0, 11.0, 90.0, 95.0, 92.0],
                vec![14.0, 15.0, 13.0, 85.0, 80.0, 84.0],
                vec![11.0, 10.0, 12.0, 92.0, 94.0, 91.0],
            ],
        )
        .unwrap();
        cpm_log2(&matrix).unwrap()
    }

    fn cluster_groups() -> GroupAssignment {
        GroupAssignment::infer(&[
            "Ctrl_1".into(),
            "Ctrl_2".into(),
            "Ctrl_3".into(),
            "Stress_1".into(),
            "Stress_2".into(),
            "Stress_3".into(),
        ])
    }

    #[test]
    fn first_component_separates_clusters() {
        let result = project(
            &two_cluster_normalized(),
            &cluster_groups(),
            &ProjectionConfig::default(),
        )
        .unwrap();

        let pc1: Vec<f64> = result
            .samples()
            .iter()
            .map(|s| s.coordinates[0])
            .collect();
        // All control samples on one side of zero, all stress on the other.
        let control_side = pc1[0].signum();
        assert!(pc1[..3].iter().all(|&v| v.signum() == control_side));
        assert!(pc1[3..].iter().all(|&v| v.signum() == -control_side));
    }

    #[test]
    fn variance_ratios_are_descending_and_bounded() {
        let config = ProjectionConfig {
            components: 3,
            ..ProjectionConfig::default()
        };
        let result = project(&two_cluster_normalized(), &cluster_groups(), &config).unwrap();
        let ratios = result.explained_variance_ratio();

        assert_eq!(ratios.len(), 3);
        for w in ratios.windows(2) {
            assert!(w[0] >= w[1] - 1e-6, "not descending: {ratios:?}");
        }
        assert!(ratios.iter().all(|&r| (0.0..=1.0).contains(&r)));
        assert!(ratios.iter().sum::<f64>() <= 1.0 + 1e-9);
    }

    #[test]
    fn dominant_axis_captures_most_variance() {
        let result = project(
            &two_cluster_normalized(),
            &cluster_groups(),
            &ProjectionConfig::default(),
        )
        .unwrap();
        assert!(result.explained_variance_ratio()[0] > 0.5);
    }

    #[test]
    fn attaches_group_labels() {
        let result = project(
            &two_cluster_normalized(),
            &cluster_groups(),
            &ProjectionConfig::default(),
        )
        .unwrap();
        assert_eq!(result.samples().len(), 6);
        assert_eq!(result.samples()[0].group, Group::Control);
        assert_eq!(result.samples()[5].group, Group::Stress);
        assert!(result.samples().iter().all(|s| s.coordinates.len() == 2));
    }

    #[test]
    fn component_count_beyond_rank_bound_is_rejected() {
        // 6 samples support at most 5 components.
        let config = ProjectionConfig {
            components: 6,
            ..ProjectionConfig::default()
        };
        match project(&two_cluster_normalized(), &cluster_groups(), &config) {
            Err(ExpressionError::InvalidDimension { requested, limit }) => {
                assert_eq!(requested, 6);
                assert_eq!(limit, 5);
            }
            other => panic!("expected InvalidDimension, got {other:?}"),
        }
    }

    #[test]
    fn zero_components_is_rejected() {
        let config = ProjectionConfig {
            components: 0,
            ..ProjectionConfig::default()
        };
        assert!(project(&two_cluster_normalized(), &cluster_groups(), &config).is_err());
    }

    #[test]
    fn missing_label_is_invalid_input() {
        let groups = GroupAssignment::from_pairs([("Ctrl_1", Group::Control)]);
        let result = project(
            &two_cluster_normalized(),
            &groups,
            &ProjectionConfig::default(),
        );
        assert!(matches!(result, Err(ExpressionError::InvalidInput(_))));
    }

    #[test]
    fn identical_samples_have_zero_variance_ratios() {
        let normalized = NormalizedMatrix::new(
            vec!["Gene_001".into(), "Gene_002".into()],
            vec![
                "Ctrl_1".into(),
                "Ctrl_2".into(),
                "Stress_1".into(),
                "Stress_2".into(),
            ],
            array![[3.0, 3.0, 3.0, 3.0], [7.0, 7.0, 7.0, 7.0]],
        )
        .unwrap();
        let groups = GroupAssignment::infer(normalized.samples());
        let result = project(&normalized, &groups, &ProjectionConfig::default()).unwrap();
        assert!(result.explained_variance_ratio().iter().all(|&r| r == 0.0));
        for s in result.samples() {
            assert!(s.coordinates.iter().all(|&c| c.abs() < 1e-9));
        }
    }
}
