//! Schottky-defect extraction against an ideal reference supercell.
//!
//! [`ideal`] builds the defect-free reference structure from a template, and [`diff`]
//! computes the set of atoms in which an observed structure departs from it, reconciling
//! floating-point noise at five-decimal fractional precision.

pub mod diff;
pub mod ideal;
