//! # Workflows Module
//!
//! The top-level entry points of the pipeline. Each workflow takes a validated config
//! from [`crate::engine::config`] and a [`ProgressReporter`](crate::engine::progress::ProgressReporter),
//! loads its inputs, runs the batch in parallel and writes its outputs.
//!
//! - **Ideal lattice** ([`ideal`]) - Builds and writes the defect-free reference supercell.
//! - **Defect extraction** ([`extract`]) - Diffs every structure of a directory against
//!   the reference and writes one defect structure per input.
//! - **Featurization** ([`featurize`]) - Produces the feature table, optionally joined
//!   with known band gaps.
//! - **Prediction** ([`predict`]) - Scores feature rows or structures with a pretrained
//!   model and writes the submission table.

pub(crate) mod dataset;
pub mod extract;
pub mod featurize;
pub mod ideal;
pub mod predict;
