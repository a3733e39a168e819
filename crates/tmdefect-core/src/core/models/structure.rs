use super::atom::Atom;
use super::element::Element;
use super::lattice::Lattice;
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Grams per cubic centimetre for one atomic mass unit per cubic Angstrom.
const AMU_PER_CUBIC_ANGSTROM_TO_G_PER_CC: f64 = 1.660_539_066_60;

/// A periodic structure: one lattice shared by an ordered list of atoms.
///
/// Structures are plain values. Operations that derive new structures (such as defect
/// extraction) build fresh instances instead of mutating existing ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    lattice: Lattice,
    atoms: Vec<Atom>,
}

impl Structure {
    pub fn new(lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Self { lattice, atoms }
    }

    pub fn empty(lattice: Lattice) -> Self {
        Self::new(lattice, Vec::new())
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn into_atoms(self) -> Vec<Atom> {
        self.atoms
    }

    pub fn num_sites(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Element counts keyed by element.
    pub fn composition(&self) -> BTreeMap<Element, usize> {
        let mut counts = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element).or_insert(0) += 1;
        }
        counts
    }

    /// Full chemical formula, e.g. `"Mo63 S128"`.
    ///
    /// Elements are ordered by increasing electronegativity, ties broken by symbol.
    pub fn formula(&self) -> String {
        let mut entries: Vec<(Element, usize)> = self.composition().into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| {
            a.electronegativity()
                .total_cmp(&b.electronegativity())
                .then_with(|| a.symbol().cmp(b.symbol()))
        });
        entries
            .iter()
            .map(|(element, count)| format!("{}{}", element.symbol(), count))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn atomic_numbers(&self) -> Vec<u8> {
        self.atoms.iter().map(|a| a.element.atomic_number()).collect()
    }

    /// Total mass in atomic mass units.
    pub fn total_mass(&self) -> f64 {
        self.atoms.iter().map(|a| a.element.atomic_mass()).sum()
    }

    /// Mass density in g/cm³.
    pub fn density(&self) -> f64 {
        self.total_mass() / self.lattice.volume() * AMU_PER_CUBIC_ANGSTROM_TO_G_PER_CC
    }

    /// Symmetric matrix of minimum-image distances between all pairs of atoms.
    pub fn distance_matrix(&self) -> DMatrix<f64> {
        let n = self.atoms.len();
        let mut matrix = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = self.lattice.minimum_image_distance(
                    &self.atoms[i].frac_coords,
                    &self.atoms[j].frac_coords,
                );
                matrix[(i, j)] = d;
                matrix[(j, i)] = d;
            }
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn cubic(a: f64) -> Lattice {
        Lattice::from_rows([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]).unwrap()
    }

    fn atom(symbol: &str, x: f64, y: f64, z: f64) -> Atom {
        Atom::new(symbol.parse().unwrap(), Point3::new(x, y, z))
    }

    #[test]
    fn formula_orders_by_electronegativity() {
        let structure = Structure::new(
            cubic(10.0),
            vec![
                atom("S", 0.1, 0.0, 0.0),
                atom("Se", 0.2, 0.0, 0.0),
                atom("Mo", 0.3, 0.0, 0.0),
                atom("S", 0.4, 0.0, 0.0),
                atom("W", 0.5, 0.0, 0.0),
            ],
        );
        assert_eq!(structure.formula(), "Mo1 W1 Se1 S2");
    }

    #[test]
    fn empty_structure_has_empty_formula() {
        assert_eq!(Structure::empty(cubic(5.0)).formula(), "");
    }

    #[test]
    fn density_uses_cell_volume() {
        let structure = Structure::new(cubic(10.0), vec![atom("S", 0.0, 0.0, 0.0)]);
        let expected = 32.06 / 1000.0 * AMU_PER_CUBIC_ANGSTROM_TO_G_PER_CC;
        assert!((structure.density() - expected).abs() < 1e-12);
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let structure = Structure::new(
            cubic(10.0),
            vec![
                atom("Mo", 0.0, 0.0, 0.0),
                atom("S", 0.2, 0.0, 0.0),
                atom("S", 0.9, 0.0, 0.0),
            ],
        );
        let d = structure.distance_matrix();
        assert_eq!(d.nrows(), 3);
        for i in 0..3 {
            assert_eq!(d[(i, i)], 0.0);
            for j in 0..3 {
                assert_eq!(d[(i, j)], d[(j, i)]);
            }
        }
        assert!((d[(0, 1)] - 2.0).abs() < 1e-12);
        assert!((d[(0, 2)] - 1.0).abs() < 1e-12);
        assert!((d[(1, 2)] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn atomic_numbers_follow_atom_order() {
        let structure = Structure::new(
            cubic(10.0),
            vec![atom("W", 0.0, 0.0, 0.0), atom("Se", 0.5, 0.5, 0.5)],
        );
        assert_eq!(structure.atomic_numbers(), vec![74, 34]);
    }
}
