use crate::core::defects::ideal::IdealLatticeTemplate;
use crate::core::io::json::JsonFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use std::path::Path;
use tracing::{info, instrument};

/// Builds the reference structure from a template file, or the built-in MoS₂
/// supercell when `template` is `None`.
pub fn reference_structure(template: Option<&Path>) -> Result<Structure, EngineError> {
    let template = match template {
        Some(path) => {
            info!(path = %path.display(), "Loading ideal lattice template.");
            IdealLatticeTemplate::load(path)?
        }
        None => IdealLatticeTemplate::default(),
    };
    Ok(template.build()?)
}

/// Writes the reference structure as a structure file and returns it.
#[instrument(skip_all, name = "ideal_workflow")]
pub fn run(template: Option<&Path>, output: &Path) -> Result<Structure, EngineError> {
    let structure = reference_structure(template)?;
    JsonFile::write_structure_to_path(&structure, output).map_err(|source| {
        EngineError::StructureFile {
            path: output.display().to_string(),
            source,
        }
    })?;
    info!(
        sites = structure.num_sites(),
        formula = %structure.formula(),
        output = %output.display(),
        "Wrote ideal lattice."
    );
    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::defects::ideal::ideal_lattice;
    use tempfile::tempdir;

    #[test]
    fn writes_default_lattice_that_reads_back() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("ideal.json");
        run(None, &output).unwrap();

        let (read, _) = JsonFile::read_from_path(&output).unwrap();
        assert_eq!(read.num_sites(), 192);
        assert_eq!(read.formula(), ideal_lattice().formula());
    }

    #[test]
    fn custom_template_is_honoured() {
        let dir = tempdir().unwrap();
        let mut template = IdealLatticeTemplate::default();
        template.sublattices.truncate(1);
        let template_path = dir.path().join("template.toml");
        std::fs::write(&template_path, template.to_toml_string().unwrap()).unwrap();

        let structure = reference_structure(Some(&template_path)).unwrap();
        assert_eq!(structure.num_sites(), 64);
    }

    #[test]
    fn missing_template_is_an_error() {
        let dir = tempdir().unwrap();
        let result = reference_structure(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(EngineError::Template { .. })));
    }
}
