use crate::core::models::atom::Atom;
use crate::core::models::element::Element;
use crate::core::models::lattice::{Lattice, LatticeError, LatticeParameters};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to serialize template: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Template defines no sublattices")]
    NoSublattices,
    #[error("Sublattice '{sublattice}' has an empty {axis} grid")]
    EmptyGrid {
        sublattice: String,
        axis: &'static str,
    },
    #[error("Invalid template lattice: {0}")]
    Lattice(#[from] LatticeError),
}

/// An evenly spaced grid of fractional coordinates, inclusive of both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSpec {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl GridSpec {
    pub const fn new(start: f64, stop: f64, points: usize) -> Self {
        Self {
            start,
            stop,
            points,
        }
    }

    /// Grid values as `start + i * step`, with the final value pinned to `stop`.
    pub fn values(&self) -> Vec<f64> {
        match self.points {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.stop - self.start) / (n - 1) as f64;
                let mut values: Vec<f64> = (0..n).map(|i| i as f64 * step + self.start).collect();
                values[n - 1] = self.stop;
                values
            }
        }
    }
}

/// One layer of the supercell: an element on an `a × b` grid at a fixed height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SublatticeSpec {
    pub name: String,
    pub element: Element,
    pub z: f64,
    pub a_grid: GridSpec,
    pub b_grid: GridSpec,
}

/// Everything needed to build a defect-free reference supercell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdealLatticeTemplate {
    pub lattice: LatticeParameters,
    pub sublattices: Vec<SublatticeSpec>,
}

const GRID_POINTS: usize = 8;
// Half- and full-step offsets of the 8-point in-plane grids.
const HALF_STEP_START: f64 = 0.04166667;
const HALF_STEP_STOP: f64 = 0.91666667;
const FULL_STEP_START: f64 = 0.08333333;
const FULL_STEP_STOP: f64 = 0.95833333;

impl Default for IdealLatticeTemplate {
    /// The 8×8 MoS₂ monolayer supercell: S below, Mo in the middle, S above.
    fn default() -> Self {
        let shifted_a = GridSpec::new(FULL_STEP_START, FULL_STEP_STOP, GRID_POINTS);
        let shifted_b = GridSpec::new(HALF_STEP_START, HALF_STEP_STOP, GRID_POINTS);

        Self {
            lattice: LatticeParameters {
                a: 25.5225256,
                b: 25.5225256,
                c: 14.879004,
                alpha: 90.0,
                beta: 90.0,
                gamma: 120.0,
            },
            sublattices: vec![
                SublatticeSpec {
                    name: "low".into(),
                    element: Element::SULFUR,
                    z: 0.144826,
                    a_grid: shifted_a,
                    b_grid: shifted_b,
                },
                SublatticeSpec {
                    name: "mid".into(),
                    element: Element::MOLYBDENUM,
                    z: 0.25,
                    a_grid: shifted_b,
                    b_grid: shifted_a,
                },
                SublatticeSpec {
                    name: "high".into(),
                    element: Element::SULFUR,
                    z: 0.355174,
                    a_grid: shifted_a,
                    b_grid: shifted_b,
                },
            ],
        }
    }
}

impl IdealLatticeTemplate {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, TemplateError> {
        let template: Self = toml::from_str(content).map_err(|e| TemplateError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        template.validate()?;
        Ok(template)
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    pub fn to_toml_string(&self) -> Result<String, TemplateError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.sublattices.is_empty() {
            return Err(TemplateError::NoSublattices);
        }
        for sublattice in &self.sublattices {
            for (axis, grid) in [("a", &sublattice.a_grid), ("b", &sublattice.b_grid)] {
                if grid.points == 0 {
                    return Err(TemplateError::EmptyGrid {
                        sublattice: sublattice.name.clone(),
                        axis,
                    });
                }
            }
        }
        Lattice::from_parameters(self.lattice)?;
        Ok(())
    }

    /// Builds the reference structure.
    ///
    /// Sublattices are emitted in template order; within a sublattice the `a` grid is the
    /// outer loop and the `b` grid the inner one.
    pub fn build(&self) -> Result<Structure, TemplateError> {
        self.validate()?;
        let lattice = Lattice::from_parameters(self.lattice)?;

        let mut atoms = Vec::with_capacity(self.num_sites());
        for sublattice in &self.sublattices {
            let b_values = sublattice.b_grid.values();
            for a in sublattice.a_grid.values() {
                for &b in &b_values {
                    atoms.push(Atom::new(sublattice.element, Point3::new(a, b, sublattice.z)));
                }
            }
        }
        Ok(Structure::new(lattice, atoms))
    }

    pub fn num_sites(&self) -> usize {
        self.sublattices
            .iter()
            .map(|s| s.a_grid.points * s.b_grid.points)
            .sum()
    }
}

/// Builds the default MoS₂ reference supercell.
pub fn ideal_lattice() -> Structure {
    IdealLatticeTemplate::default()
        .build()
        .unwrap_or_else(|e| unreachable!("default ideal lattice template is invalid: {e}"))
}
