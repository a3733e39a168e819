use crate::core::models::atom::{Atom, RoundedPosition, SiteKey};
use crate::core::models::lattice::LatticeParameters;
use crate::core::models::structure::Structure;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq)]
pub enum DefectError {
    #[error("Observed structure contains no atoms")]
    EmptyStructure,
    #[error(
        "Observed lattice (a={:.4}, b={:.4}, c={:.4}) does not match the reference lattice (a={:.4}, b={:.4}, c={:.4})",
        .observed.a, .observed.b, .observed.c, .reference.a, .reference.b, .reference.c
    )]
    LatticeMismatch {
        observed: LatticeParameters,
        reference: LatticeParameters,
    },
    #[error("{count} reference sites round to position {position:?}, which an observed atom also occupies")]
    AmbiguousSite { position: [f64; 3], count: usize },
}

/// Immutable reference data shared by every extraction in a batch.
///
/// Holds the reference structure together with its deduplicated atoms and exact site
/// keys, so each extraction only hashes the observed side.
#[derive(Debug, Clone)]
pub struct DefectContext {
    reference: Structure,
    unique_reference: Vec<Atom>,
    reference_keys: HashSet<SiteKey>,
}

impl DefectContext {
    pub fn new(reference: Structure) -> Self {
        let (unique_reference, reference_keys) = dedup(reference.atoms());
        Self {
            reference,
            unique_reference,
            reference_keys,
        }
    }

    pub fn reference(&self) -> &Structure {
        &self.reference
    }

    /// Returns the atoms that differ between `observed` and the reference.
    ///
    /// Atoms present only in `observed` come first, in observed order, followed by
    /// reference atoms absent from `observed` whose rounded position is not occupied by
    /// any of those extra atoms, in reference order. The result uses the observed lattice.
    /// Rounded positions are matched as whole `(x, y, z)` triples, not per component.
    ///
    /// # Errors
    ///
    /// Fails if `observed` is empty, its lattice does not match the reference, or a
    /// rounded position occupied by an extra atom is shared by several missing atoms.
    pub fn extract(&self, observed: &Structure) -> Result<Structure, DefectError> {
        if observed.is_empty() {
            return Err(DefectError::EmptyStructure);
        }
        if !observed.lattice().is_compatible_with(self.reference.lattice()) {
            return Err(DefectError::LatticeMismatch {
                observed: observed.lattice().parameters(),
                reference: self.reference.lattice().parameters(),
            });
        }

        let (unique_observed, observed_keys) = dedup(observed.atoms());

        let mut defects: Vec<Atom> = unique_observed
            .into_iter()
            .filter(|atom| !self.reference_keys.contains(&atom.site_key()))
            .collect();
        let missing: Vec<&Atom> = self
            .unique_reference
            .iter()
            .filter(|atom| !observed_keys.contains(&atom.site_key()))
            .collect();

        let extra_positions: HashSet<RoundedPosition> =
            defects.iter().map(Atom::rounded_position).collect();

        let mut matched: HashMap<RoundedPosition, usize> = HashMap::new();
        for atom in &missing {
            let position = atom.rounded_position();
            if extra_positions.contains(&position) {
                *matched.entry(position).or_insert(0) += 1;
            }
        }
        if let Some((position, count)) = matched
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .min_by_key(|(position, _)| *position)
        {
            let p = position.to_point();
            return Err(DefectError::AmbiguousSite {
                position: [p.x, p.y, p.z],
                count,
            });
        }

        let extra_count = defects.len();
        defects.extend(
            missing
                .into_iter()
                .filter(|atom| !extra_positions.contains(&atom.rounded_position()))
                .cloned(),
        );
        trace!(
            extra = extra_count,
            vacancies = defects.len() - extra_count,
            "Computed structural difference."
        );

        Ok(Structure::new(observed.lattice().clone(), defects))
    }
}

/// Returns the atoms in first-seen order with exact duplicates removed, plus their keys.
fn dedup(atoms: &[Atom]) -> (Vec<Atom>, HashSet<SiteKey>) {
    let mut keys = HashSet::with_capacity(atoms.len());
    let unique = atoms
        .iter()
        .filter(|atom| keys.insert(atom.site_key()))
        .cloned()
        .collect();
    (unique, keys)
}

/// One-off form of [`DefectContext::extract`] for a single pair of structures.
pub fn diff_structures(observed: &Structure, reference: &Structure) -> Result<Structure, DefectError> {
    DefectContext::new(reference.clone()).extract(observed)
}
