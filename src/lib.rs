//! # reef-statistics
//!
//! A specialized Rust library for differential expression analysis of coral
//! gene expression data.
//!
//! This crate turns a raw genes × samples count matrix and a two-group
//! (Control/Stress) sample assignment into the statistical outputs of a
//! standard bulk RNA-seq comparison: a normalized expression matrix, a
//! per-gene test table corrected for multiple comparisons, a principal
//! component projection of the samples, and a ranked gene selection for
//! downstream display.
//!
//! ## Core Features
//!
//! - **Normalization**: counts per million with a log2 transform
//! - **Differential Expression Analysis**: per-gene Welch's t-tests, run as
//!   a parallel map over genes
//! - **Multiple Testing Correction**: Benjamini-Hochberg FDR across the
//!   full gene set
//! - **Sample Projection**: PCA of samples with explained-variance ratios
//! - **Gene Ranking**: top-N selection from the sorted result table
//!
//! ## Quick Start
//!
//! Build an [`matrix::ExpressionMatrix`] from counts and identifiers, label
//! the samples with a [`matrix::GroupAssignment`], and either call the
//! stages individually or run [`pipeline::run`] for the whole pass. All
//! outputs are immutable snapshots; feeding them to files, databases, or
//! charts is the embedding application's job.
//!
//! ## Module Organization
//!
//! - **[`matrix`]**: count matrices, normalized matrices, and group labels
//! - **[`normalization`]**: log2(CPM + 1) normalization
//! - **[`testing`]**: hypothesis tests, effect sizes, and FDR correction
//! - **[`projection`]**: principal component projection of samples
//! - **[`selection`]**: top-N gene selection
//! - **[`pipeline`]**: one-pass driver over all stages
//! - **[`error`]**: the crate's error taxonomy

pub mod error;
pub mod matrix;
pub mod normalization;
pub mod pipeline;
pub mod projection;
pub mod selection;
pub mod testing;

pub use error::{ExpressionError, Result};
