//! Provides input/output functionality for structure files and tabular data.
//!
//! Structures are exchanged as pymatgen-compatible JSON documents through the
//! [`traits::StructureFile`] interface. Targets, feature tables and submissions are
//! plain CSV.

pub mod dataset;
pub mod json;
pub mod table;
pub mod traits;
