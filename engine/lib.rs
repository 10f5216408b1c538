#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

//! Generalized Morphological Component Analysis.
//!
//! Factorizes an observed (channels × samples) matrix `X ≈ A·S` into a mixing
//! matrix `A` with unit-norm columns and sparse sources `S`, by alternating a
//! soft-thresholded source update with a least-squares mixing update.

pub mod anneal;
pub mod config;
pub mod debias;
pub mod error;
pub mod linalg;
pub mod mixing;
pub mod optimize;
pub mod remainder;
pub mod sources;
pub mod sweep;
pub mod workspace;

pub use anneal::{AnnealConfig, ThresholdSchedule};
pub use config::{ConfigError, RunConfig};
pub use debias::{debias, debias_into};
pub use error::GmcaError;
pub use linalg::{dead_sources, l1_reconstruction_error, normalize_columns, pseudo_inverse};
pub use mixing::update_mixing;
pub use optimize::{GmcaOptions, OptimizeReport, optimize};
pub use remainder::remainder;
pub use sources::{soft_threshold, update_sources};
pub use sweep::SweepOrder;
pub use workspace::Workspace;
