use phf::{Map, phf_map};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Static physical properties of a chemical element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    /// Atomic number (Z).
    pub atomic_number: u8,
    /// Standard atomic mass in atomic mass units.
    pub atomic_mass: f64,
    /// Pauling electronegativity. Noble gases without a defined value use `f64::INFINITY`
    /// so they sort last in formulas.
    pub electronegativity: f64,
    /// Single-bond covalent radius in Angstroms.
    pub covalent_radius: f64,
}

const fn data(z: u8, mass: f64, x: f64, r: f64) -> ElementData {
    ElementData {
        atomic_number: z,
        atomic_mass: mass,
        electronegativity: x,
        covalent_radius: r,
    }
}

static ELEMENTS: Map<&'static str, ElementData> = phf_map! {
    // --- Period 1 ---
    "H" => data(1, 1.008, 2.20, 0.31),
    "He" => data(2, 4.002602, f64::INFINITY, 0.28),
    // --- Period 2 ---
    "Li" => data(3, 6.94, 0.98, 1.28),
    "Be" => data(4, 9.0121831, 1.57, 0.96),
    "B" => data(5, 10.81, 2.04, 0.84),
    "C" => data(6, 12.011, 2.55, 0.76),
    "N" => data(7, 14.007, 3.04, 0.71),
    "O" => data(8, 15.999, 3.44, 0.66),
    "F" => data(9, 18.998403163, 3.98, 0.57),
    "Ne" => data(10, 20.1797, f64::INFINITY, 0.58),
    // --- Period 3 ---
    "Na" => data(11, 22.98976928, 0.93, 1.66),
    "Mg" => data(12, 24.305, 1.31, 1.41),
    "Al" => data(13, 26.9815385, 1.61, 1.21),
    "Si" => data(14, 28.085, 1.90, 1.11),
    "P" => data(15, 30.973761998, 2.19, 1.07),
    "S" => data(16, 32.06, 2.58, 1.05),
    "Cl" => data(17, 35.45, 3.16, 1.02),
    "Ar" => data(18, 39.948, f64::INFINITY, 1.06),
    // --- Period 4 ---
    "K" => data(19, 39.0983, 0.82, 2.03),
    "Ca" => data(20, 40.078, 1.00, 1.76),
    "Sc" => data(21, 44.955908, 1.36, 1.70),
    "Ti" => data(22, 47.867, 1.54, 1.60),
    "V" => data(23, 50.9415, 1.63, 1.53),
    "Cr" => data(24, 51.9961, 1.66, 1.39),
    "Mn" => data(25, 54.938044, 1.55, 1.39),
    "Fe" => data(26, 55.845, 1.83, 1.32),
    "Co" => data(27, 58.933194, 1.88, 1.26),
    "Ni" => data(28, 58.6934, 1.91, 1.24),
    "Cu" => data(29, 63.546, 1.90, 1.32),
    "Zn" => data(30, 65.38, 1.65, 1.22),
    "Ga" => data(31, 69.723, 1.81, 1.22),
    "Ge" => data(32, 72.630, 2.01, 1.20),
    "As" => data(33, 74.921595, 2.18, 1.19),
    "Se" => data(34, 78.971, 2.55, 1.20),
    "Br" => data(35, 79.904, 2.96, 1.20),
    "Kr" => data(36, 83.798, 3.00, 1.16),
    // --- Period 5 ---
    "Rb" => data(37, 85.4678, 0.82, 2.20),
    "Sr" => data(38, 87.62, 0.95, 1.95),
    "Y" => data(39, 88.90584, 1.22, 1.90),
    "Zr" => data(40, 91.224, 1.33, 1.75),
    "Nb" => data(41, 92.90637, 1.60, 1.64),
    "Mo" => data(42, 95.95, 2.16, 1.54),
    "Tc" => data(43, 98.0, 1.90, 1.47),
    "Ru" => data(44, 101.07, 2.20, 1.46),
    "Rh" => data(45, 102.90550, 2.28, 1.42),
    "Pd" => data(46, 106.42, 2.20, 1.39),
    "Ag" => data(47, 107.8682, 1.93, 1.45),
    "Cd" => data(48, 112.414, 1.69, 1.44),
    "In" => data(49, 114.818, 1.78, 1.42),
    "Sn" => data(50, 118.710, 1.96, 1.39),
    "Sb" => data(51, 121.760, 2.05, 1.39),
    "Te" => data(52, 127.60, 2.10, 1.38),
    "I" => data(53, 126.90447, 2.66, 1.39),
    "Xe" => data(54, 131.293, 2.60, 1.40),
    // --- Period 6 (transition metals) ---
    "Hf" => data(72, 178.49, 1.30, 1.75),
    "Ta" => data(73, 180.94788, 1.50, 1.70),
    "W" => data(74, 183.84, 2.36, 1.62),
    "Re" => data(75, 186.207, 1.90, 1.51),
    "Os" => data(76, 190.23, 2.20, 1.44),
    "Ir" => data(77, 192.217, 2.20, 1.41),
    "Pt" => data(78, 195.084, 2.28, 1.36),
    "Au" => data(79, 196.966569, 2.54, 1.36),
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct ElementError(pub String);

/// A chemical element, identified by its canonical symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element {
    symbol: &'static str,
}

impl Element {
    pub const MOLYBDENUM: Self = Self { symbol: "Mo" };
    pub const SULFUR: Self = Self { symbol: "S" };
    pub const SELENIUM: Self = Self { symbol: "Se" };
    pub const TUNGSTEN: Self = Self { symbol: "W" };

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn data(&self) -> &'static ElementData {
        // Elements are only constructed from keys of the table.
        &ELEMENTS[self.symbol]
    }

    pub fn atomic_number(&self) -> u8 {
        self.data().atomic_number
    }

    pub fn atomic_mass(&self) -> f64 {
        self.data().atomic_mass
    }

    pub fn electronegativity(&self) -> f64 {
        self.data().electronegativity
    }

    pub fn covalent_radius(&self) -> f64 {
        self.data().covalent_radius
    }
}

impl FromStr for Element {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ELEMENTS
            .get_entry(trimmed)
            .map(|(symbol, _)| Element { symbol: *symbol })
            .ok_or_else(|| ElementError(trimmed.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_symbols() {
        let mo: Element = "Mo".parse().unwrap();
        assert_eq!(mo.symbol(), "Mo");
        assert_eq!(mo.atomic_number(), 42);

        let s: Element = " S ".parse().unwrap();
        assert_eq!(s.atomic_number(), 16);
    }

    #[test]
    fn rejects_unknown_and_miscased_symbols() {
        assert_eq!(
            "Xx".parse::<Element>(),
            Err(ElementError("Xx".to_string()))
        );
        assert!("mo".parse::<Element>().is_err());
        assert!("".parse::<Element>().is_err());
    }

    #[test]
    fn chalcogens_are_more_electronegative_than_their_metals() {
        for metal in ["Mo", "W"] {
            for chalcogen in ["S", "Se"] {
                let m: Element = metal.parse().unwrap();
                let c: Element = chalcogen.parse().unwrap();
                assert!(m.electronegativity() < c.electronegativity());
            }
        }
    }

    #[test]
    fn named_constants_match_parsed_elements() {
        assert_eq!(Element::MOLYBDENUM, "Mo".parse().unwrap());
        assert_eq!(Element::SULFUR, "S".parse().unwrap());
        assert_eq!(Element::SELENIUM, "Se".parse().unwrap());
        assert_eq!(Element::TUNGSTEN, "W".parse().unwrap());
    }

    #[test]
    fn display_prints_symbol() {
        let w: Element = "W".parse().unwrap();
        assert_eq!(w.to_string(), "W");
    }
}
