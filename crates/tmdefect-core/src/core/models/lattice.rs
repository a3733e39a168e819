use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LENGTH_TOLERANCE: f64 = 1e-3;
const ANGLE_TOLERANCE_DEG: f64 = 1e-3;
const SINGULAR_VOLUME: f64 = 1e-8;

#[derive(Debug, Error, PartialEq)]
pub enum LatticeError {
    #[error("Lattice length '{name}' must be positive (got {value})")]
    NonPositiveLength { name: &'static str, value: f64 },
    #[error("Lattice angle '{name}' must lie strictly between 0 and 180 degrees (got {value})")]
    InvalidAngle { name: &'static str, value: f64 },
    #[error("Lattice vectors are degenerate (volume {volume:.3e})")]
    Degenerate { volume: f64 },
}

/// The six scalar parameters of a unit cell. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// A periodic unit cell. Rows of the matrix are the lattice vectors a, b and c in Angstroms.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    matrix: Matrix3<f64>,
}

impl Lattice {
    /// Builds a lattice from its six parameters.
    ///
    /// The vectors follow the common crystallographic orientation in which `c` lies along
    /// the Cartesian z axis and `a` lies in the xz plane.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive lengths, angles outside (0, 180) or a
    /// combination of angles that yields a degenerate cell.
    pub fn from_parameters(params: LatticeParameters) -> Result<Self, LatticeError> {
        for (name, value) in [("a", params.a), ("b", params.b), ("c", params.c)] {
            if !(value > 0.0) {
                return Err(LatticeError::NonPositiveLength { name, value });
            }
        }
        for (name, value) in [
            ("alpha", params.alpha),
            ("beta", params.beta),
            ("gamma", params.gamma),
        ] {
            if !(value > 0.0 && value < 180.0) {
                return Err(LatticeError::InvalidAngle { name, value });
            }
        }

        let (alpha, beta, gamma) = (
            params.alpha.to_radians(),
            params.beta.to_radians(),
            params.gamma.to_radians(),
        );
        let cos_gamma_star = ((alpha.cos() * beta.cos() - gamma.cos())
            / (alpha.sin() * beta.sin()))
        .clamp(-1.0, 1.0);
        let gamma_star = cos_gamma_star.acos();

        let a_vec = [params.a * beta.sin(), 0.0, params.a * beta.cos()];
        let b_vec = [
            -params.b * alpha.sin() * gamma_star.cos(),
            params.b * alpha.sin() * gamma_star.sin(),
            params.b * alpha.cos(),
        ];
        let c_vec = [0.0, 0.0, params.c];

        Self::from_rows([a_vec, b_vec, c_vec])
    }

    /// Builds a lattice from three row vectors.
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Result<Self, LatticeError> {
        let matrix = Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]);
        let volume = matrix.determinant().abs();
        if !(volume > SINGULAR_VOLUME) {
            return Err(LatticeError::Degenerate { volume });
        }
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    fn vector(&self, row: usize) -> Vector3<f64> {
        self.matrix.row(row).transpose()
    }

    pub fn parameters(&self) -> LatticeParameters {
        let (va, vb, vc) = (self.vector(0), self.vector(1), self.vector(2));
        let angle = |u: &Vector3<f64>, v: &Vector3<f64>| {
            (u.dot(v) / (u.norm() * v.norm()))
                .clamp(-1.0, 1.0)
                .acos()
                .to_degrees()
        };
        LatticeParameters {
            a: va.norm(),
            b: vb.norm(),
            c: vc.norm(),
            alpha: angle(&vb, &vc),
            beta: angle(&va, &vc),
            gamma: angle(&va, &vb),
        }
    }

    /// Cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    pub fn to_cartesian(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.matrix.transpose() * frac.coords)
    }

    /// Shortest distance between two fractional positions over all periodic images.
    pub fn minimum_image_distance(&self, from: &Point3<f64>, to: &Point3<f64>) -> f64 {
        let delta = (to - from).map(|x| x - x.round());

        let transposed = self.matrix.transpose();
        let mut best = f64::INFINITY;
        for i in -1..=1 {
            for j in -1..=1 {
                for k in -1..=1 {
                    let shifted = delta + Vector3::new(i as f64, j as f64, k as f64);
                    let distance = (transposed * shifted).norm();
                    if distance < best {
                        best = distance;
                    }
                }
            }
        }
        best
    }

    /// Whether two lattices describe the same cell, compared by parameters.
    pub fn is_compatible_with(&self, other: &Lattice) -> bool {
        let p = self.parameters();
        let q = other.parameters();
        (p.a - q.a).abs() <= LENGTH_TOLERANCE
            && (p.b - q.b).abs() <= LENGTH_TOLERANCE
            && (p.c - q.c).abs() <= LENGTH_TOLERANCE
            && (p.alpha - q.alpha).abs() <= ANGLE_TOLERANCE_DEG
            && (p.beta - q.beta).abs() <= ANGLE_TOLERANCE_DEG
            && (p.gamma - q.gamma).abs() <= ANGLE_TOLERANCE_DEG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagonal() -> Lattice {
        Lattice::from_parameters(LatticeParameters {
            a: 25.5225256,
            b: 25.5225256,
            c: 14.879004,
            alpha: 90.0,
            beta: 90.0,
            gamma: 120.0,
        })
        .unwrap()
    }

    fn cubic(a: f64) -> Lattice {
        Lattice::from_rows([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]).unwrap()
    }

    #[test]
    fn from_parameters_round_trips_parameters() {
        let p = hexagonal().parameters();
        assert!((p.a - 25.5225256).abs() < 1e-9);
        assert!((p.b - 25.5225256).abs() < 1e-9);
        assert!((p.c - 14.879004).abs() < 1e-9);
        assert!((p.alpha - 90.0).abs() < 1e-9);
        assert!((p.beta - 90.0).abs() < 1e-9);
        assert!((p.gamma - 120.0).abs() < 1e-9);
    }

    #[test]
    fn hexagonal_volume_matches_closed_form() {
        let expected = 25.5225256f64.powi(2) * 14.879004 * 120f64.to_radians().sin();
        assert!((hexagonal().volume() - expected).abs() < 1e-6);
    }

    #[test]
    fn c_axis_points_along_z() {
        let cart = hexagonal().to_cartesian(&Point3::new(0.0, 0.0, 0.5));
        assert!(cart.x.abs() < 1e-12);
        assert!(cart.y.abs() < 1e-12);
        assert!((cart.z - 14.879004 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn minimum_image_wraps_across_cell_boundary() {
        let lattice = cubic(10.0);
        let d = lattice.minimum_image_distance(&Point3::new(0.05, 0.0, 0.0), &Point3::new(0.95, 0.0, 0.0));
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn minimum_image_handles_skewed_cells() {
        let lattice = hexagonal();
        let a = 25.5225256;
        // Neighbours along a + b are one lattice constant apart in a 120 degree cell.
        let d = lattice.minimum_image_distance(&Point3::new(0.0, 0.0, 0.0), &Point3::new(0.9, 0.9, 0.0));
        assert!((d - 0.1 * a).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut params = hexagonal().parameters();
        params.a = 0.0;
        assert!(matches!(
            Lattice::from_parameters(params),
            Err(LatticeError::NonPositiveLength { name: "a", .. })
        ));

        let mut params = hexagonal().parameters();
        params.gamma = 180.0;
        assert!(matches!(
            Lattice::from_parameters(params),
            Err(LatticeError::InvalidAngle { name: "gamma", .. })
        ));
    }

    #[test]
    fn rejects_singular_rows() {
        let result = Lattice::from_rows([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(result, Err(LatticeError::Degenerate { .. })));
    }

    #[test]
    fn compatibility_ignores_orientation() {
        let by_params = hexagonal();
        let rotated = Lattice::from_rows([
            [25.5225256, 0.0, 0.0],
            [-25.5225256 / 2.0, 25.5225256 * 3f64.sqrt() / 2.0, 0.0],
            [0.0, 0.0, 14.879004],
        ])
        .unwrap();
        assert!(by_params.is_compatible_with(&rotated));
        assert!(!by_params.is_compatible_with(&cubic(10.0)));
    }
}
