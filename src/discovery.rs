//! Input discovery: resolves the positional path argument to a set of NZB
//! filenames plus the directory containing them.
//!
//! A file argument must itself be an `.nzb` file; a directory argument is
//! scanned non-recursively for `.nzb` entries. The returned filename order is
//! whatever the filesystem yields and carries no meaning downstream.

use std::path::{Path, PathBuf};

use crate::error::DiscoveryError;

/// Resolves `path` to `(filenames, source_dir)`.
///
/// # Errors
///
/// - [`DiscoveryError::NotFound`] if the path does not exist
/// - [`DiscoveryError::NotAnNzbFile`] if it is a file without an `.nzb`
///   extension (matched case-insensitively)
/// - [`DiscoveryError::EmptyDirectory`] if it is a directory containing no
///   `.nzb` files
pub fn discover(path: &Path) -> Result<(Vec<String>, PathBuf), DiscoveryError> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| DiscoveryError::NotFound(path.display().to_string()))?;

    if !metadata.is_dir() {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !has_nzb_extension(&filename) {
            return Err(DiscoveryError::NotAnNzbFile(path.display().to_string()));
        }
        let source_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        return Ok((vec![filename], source_dir));
    }

    let entries = std::fs::read_dir(path).map_err(|source| DiscoveryError::ReadDir {
        path: path.display().to_string(),
        source,
    })?;

    let mut filenames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::ReadDir {
            path: path.display().to_string(),
            source,
        })?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if has_nzb_extension(&name) {
            filenames.push(name);
        }
    }

    if filenames.is_empty() {
        return Err(DiscoveryError::EmptyDirectory(path.display().to_string()));
    }

    Ok((filenames, path.to_path_buf()))
}

fn has_nzb_extension(name: &str) -> bool {
    let len = name.len();
    len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".nzb")
}
