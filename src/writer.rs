//! Output writing: computes the destination path from the reconciled name and
//! password, serializes the document, and persists it.
//!
//! Serialization happens fully in memory before any byte reaches disk, so a
//! failed task never leaves a partially written output behind. An existing
//! file at the destination is overwritten.

use std::path::{Path, PathBuf};

use crate::error::TaskError;
use crate::nzb::{self, Document};
use crate::{codec, transform::TransformOutcome};

/// Serializes the transformed document and writes it under the encoded
/// output filename inside `dest_dir`.
///
/// `source_filename` is only used to attribute errors to the input file.
/// Returns the written path.
pub fn write_document(
    outcome: &TransformOutcome,
    dest_dir: &Path,
    source_filename: &str,
) -> Result<PathBuf, TaskError> {
    let output_path = output_path(dest_dir, &outcome.base_name, &outcome.password);
    let content = serialize(&outcome.doc, source_filename)?;

    tracing::debug!(path = %output_path.display(), "Writing new NZB file to disk");
    std::fs::write(&output_path, content).map_err(|source| TaskError::Write {
        path: output_path.display().to_string(),
        source,
    })?;

    Ok(output_path)
}

/// Computes the destination path for a reconciled (base name, password) pair.
pub fn output_path(dest_dir: &Path, base_name: &str, password: &str) -> PathBuf {
    dest_dir.join(codec::encode(base_name, password))
}

fn serialize(doc: &Document, source_filename: &str) -> Result<String, TaskError> {
    nzb::serialize(doc).map_err(|source| TaskError::Serialize {
        filename: source_filename.to_string(),
        source,
    })
}
