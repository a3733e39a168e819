//! # Core Module
//!
//! Stateless building blocks of the pipeline: value types for periodic structures,
//! file formats, and the algorithms that the workflows compose.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Elements, lattices, atoms and structures
//! - **File I/O** ([`io`]) - pymatgen-compatible JSON structures and CSV tables
//! - **Defect Extraction** ([`defects`]) - Ideal reference supercells and structural differences
//! - **Featurization** ([`features`]) - Structural statistics and coordination-graph metrics
//! - **Inference** ([`inference`]) - Pretrained scorers behind a narrow prediction interface

pub mod defects;
pub mod features;
pub mod inference;
pub mod io;
pub mod models;
