//! Descriptors of atomic structures for band-gap regression.
//!
//! Each structure becomes one [`table::FeatureRow`]: composition and distance
//! statistics, metrics of the coordination graph built with a bond-length cutoff, and
//! band-gap statistics of training structures that share its formula.

pub mod extractor;
pub mod formula_stats;
pub mod graph;
pub mod graph_metrics;
pub mod stats;
pub mod table;
