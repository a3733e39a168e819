//! Value types for periodic atomic structures: elements, lattices, atoms and structures.

pub mod atom;
pub mod element;
pub mod lattice;
pub mod structure;
