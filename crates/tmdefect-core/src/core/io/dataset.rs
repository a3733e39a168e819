use std::io;
use std::path::{Path, PathBuf};

const STRUCTURE_EXTENSION: &str = "json";

/// A structure file discovered in a dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureEntry {
    /// File stem, used as the structure id throughout the pipeline.
    pub id: String,
    pub path: PathBuf,
}

/// Lists the `*.json` files directly inside `dir`, sorted by file name.
///
/// Subdirectories and files with other extensions are ignored. A structure file whose
/// name is not valid UTF-8 has no usable id and fails the listing.
pub fn list_structure_files(dir: &Path) -> io::Result<Vec<StructureEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(STRUCTURE_EXTENSION) {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("structure file name is not valid UTF-8: {}", path.display()),
            ));
        };
        entries.push(StructureEntry {
            id: id.to_string(),
            path,
        });
    }
    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(entries)
}
