//! Effect size: log2 fold change between two groups.

/// Log2 fold change of `group` over `reference`, computed from raw
/// per-group mean counts with a pseudo-count added to each mean.
///
/// `log2(mean(group) + pseudo) − log2(mean(reference) + pseudo)`
///
/// The pipeline uses a pseudo-count of 1.0, matching the log2(mean + 1)
/// convention of the result table. Empty groups are the caller's problem;
/// the engine guards group sizes before any per-gene work.
pub fn log2_fold_change(group: &[f64], reference: &[f64], pseudo_count: f64) -> f64 {
    let mean_group = group.iter().sum::<f64>() / group.len() as f64;
    let mean_reference = reference.iter().sum::<f64>() / reference.len() as f64;
    ((mean_group + pseudo_count) / (mean_reference + pseudo_count)).log2()
}
