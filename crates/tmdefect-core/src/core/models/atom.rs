use super::element::Element;
use nalgebra::Point3;

/// Number of decimal places at which two fractional coordinates denote the same site.
pub const SITE_DECIMALS: i32 = 5;

/// An atom placed at a fractional position inside a periodic lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The chemical element occupying the site.
    pub element: Element,
    /// Fractional coordinates with respect to the parent lattice vectors.
    pub frac_coords: Point3<f64>,
}

/// Exact identity of an atom: its element and the bit patterns of its coordinates.
///
/// Two atoms share a key only when their coordinates compare equal as floats, so any
/// numerical noise produces distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteKey {
    element: Element,
    bits: [u64; 3],
}

/// A fractional position rounded to [`SITE_DECIMALS`] decimals, stored as scaled integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundedPosition(pub [i64; 3]);

impl Atom {
    pub fn new(element: Element, frac_coords: Point3<f64>) -> Self {
        Self {
            element,
            frac_coords,
        }
    }

    pub fn site_key(&self) -> SiteKey {
        // Adding +0.0 folds -0.0 onto 0.0 so equal floats share a key.
        let bits = |x: f64| (x + 0.0).to_bits();
        SiteKey {
            element: self.element,
            bits: [
                bits(self.frac_coords.x),
                bits(self.frac_coords.y),
                bits(self.frac_coords.z),
            ],
        }
    }

    /// Rounds each fractional coordinate half-to-even at [`SITE_DECIMALS`] places.
    pub fn rounded_position(&self) -> RoundedPosition {
        let scale = 10f64.powi(SITE_DECIMALS);
        let round = |x: f64| (x * scale).round_ties_even() as i64;
        RoundedPosition([
            round(self.frac_coords.x),
            round(self.frac_coords.y),
            round(self.frac_coords.z),
        ])
    }
}

impl RoundedPosition {
    pub fn to_point(&self) -> Point3<f64> {
        let scale = 10f64.powi(SITE_DECIMALS);
        Point3::new(
            self.0[0] as f64 / scale,
            self.0[1] as f64 / scale,
            self.0[2] as f64 / scale,
        )
    }
}
