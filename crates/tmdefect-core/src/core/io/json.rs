use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::element::{Element, ElementError};
use crate::core::models::lattice::{Lattice, LatticeError};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed structure document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid lattice: {0}")]
    Lattice(#[from] LatticeError),
    #[error("Site {site}: {source}")]
    Element { site: usize, source: ElementError },
    #[error("Site {site} carries {count} species; only fully ordered sites are supported")]
    DisorderedSite { site: usize, count: usize },
}

/// Document-level fields that are carried through unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonMetadata {
    pub charge: f64,
    pub properties: Map<String, Value>,
}

#[derive(Deserialize)]
struct StructureDocument {
    lattice: LatticeDocument,
    sites: Vec<SiteDocument>,
    #[serde(default)]
    charge: Option<f64>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct LatticeDocument {
    matrix: [[f64; 3]; 3],
}

#[derive(Deserialize)]
struct SiteDocument {
    species: Vec<SpeciesDocument>,
    abc: [f64; 3],
}

#[derive(Deserialize)]
struct SpeciesDocument {
    element: String,
}

#[derive(Serialize)]
struct StructureOutput<'a> {
    #[serde(rename = "@module")]
    module: &'static str,
    #[serde(rename = "@class")]
    class: &'static str,
    charge: f64,
    lattice: LatticeOutput,
    properties: &'a Map<String, Value>,
    sites: Vec<SiteOutput>,
}

#[derive(Serialize)]
struct LatticeOutput {
    matrix: [[f64; 3]; 3],
    pbc: [bool; 3],
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
    volume: f64,
}

#[derive(Serialize)]
struct SiteOutput {
    species: [SpeciesOutput; 1],
    abc: [f64; 3],
    xyz: [f64; 3],
    label: &'static str,
    properties: Map<String, Value>,
}

#[derive(Serialize)]
struct SpeciesOutput {
    element: &'static str,
    occu: f64,
}

/// The pymatgen `Structure.as_dict()` JSON layout.
///
/// Only `lattice.matrix`, `sites[].species[].element` and `sites[].abc` are required
/// when reading; every other key is optional and ignored unless listed in
/// [`JsonMetadata`].
pub struct JsonFile;

impl StructureFile for JsonFile {
    type Metadata = JsonMetadata;
    type Error = StructureFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let document: StructureDocument = serde_json::from_reader(reader)?;
        let lattice = Lattice::from_rows(document.lattice.matrix)?;

        let atoms = document
            .sites
            .into_iter()
            .enumerate()
            .map(|(site, doc)| {
                if doc.species.len() != 1 {
                    return Err(StructureFileError::DisorderedSite {
                        site,
                        count: doc.species.len(),
                    });
                }
                let element: Element = doc.species[0]
                    .element
                    .parse()
                    .map_err(|source| StructureFileError::Element { site, source })?;
                Ok(Atom::new(
                    element,
                    Point3::new(doc.abc[0], doc.abc[1], doc.abc[2]),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let metadata = JsonMetadata {
            charge: document.charge.unwrap_or(0.0),
            properties: document.properties.unwrap_or_default(),
        };
        Ok((Structure::new(lattice, atoms), metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let lattice = structure.lattice();
        let params = lattice.parameters();
        let sites = structure
            .atoms()
            .iter()
            .map(|atom| {
                let xyz = lattice.to_cartesian(&atom.frac_coords);
                SiteOutput {
                    species: [SpeciesOutput {
                        element: atom.element.symbol(),
                        occu: 1.0,
                    }],
                    abc: [atom.frac_coords.x, atom.frac_coords.y, atom.frac_coords.z],
                    xyz: [xyz.x, xyz.y, xyz.z],
                    label: atom.element.symbol(),
                    properties: Map::new(),
                }
            })
            .collect();

        let document = StructureOutput {
            module: "pymatgen.core.structure",
            class: "Structure",
            charge: metadata.charge,
            lattice: LatticeOutput {
                matrix: lattice.rows(),
                pbc: [true; 3],
                a: params.a,
                b: params.b,
                c: params.c,
                alpha: params.alpha,
                beta: params.beta,
                gamma: params.gamma,
                volume: lattice.volume(),
            },
            properties: &metadata.properties,
            sites,
        };

        serde_json::to_writer_pretty(&mut *writer, &document)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
