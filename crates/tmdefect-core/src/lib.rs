//! # tmdefect Core Library
//!
//! Schottky-defect extraction, structure featurization and band-gap scoring for
//! transition-metal dichalcogenide monolayers.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Lattice`),
//!   structure and table I/O, the ideal-lattice builder and defect diff, feature
//!   extraction, and pretrained scorers.
//!
//! - **[`engine`]: Run Plumbing.** Typed configuration builders, the `EngineError`
//!   taxonomy, and progress reporting shared by every workflow.
//!
//! - **[`workflows`]: The Public API.** Complete batch procedures (`extract`,
//!   `featurize`, `predict`) that tie `engine` and `core` together.

pub mod core;
pub mod engine;
pub mod workflows;
