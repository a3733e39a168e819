//! Pretrained band-gap scorers behind a narrow prediction interface.
//!
//! Nothing here trains a model. Scorers are loaded from JSON weight files and consume
//! feature rows ([`model::TabularModel`]) or, through [`model::FeaturizingModel`],
//! whole structures ([`model::StructureModel`]).

pub mod linear;
pub mod metrics;
pub mod model;
pub mod tree;
