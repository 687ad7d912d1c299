//! Transformation rule engine.
//!
//! Applies the configured password/title reconciliation rules to one parsed
//! document together with the values decoded from its filename. The engine is
//! a pure function: it owns no state, performs no IO, and applying it twice
//! with the same options to its own output changes nothing (except where a
//! metadata entry was already removed).
//!
//! Rule order matters. Later rules read state mutated by earlier ones, and
//! the final rule (remove password from filename) unconditionally overrides
//! whatever rule 6 decided. That precedence is intentional and must not be
//! reordered.

use serde::Serialize;

use crate::nzb::Document;
use crate::validate::is_valid_filename;

/// Metadata key holding the archive password.
pub const META_PASSWORD: &str = "password";

/// Metadata key holding the display title.
pub const META_TITLE: &str = "title";

/// Immutable snapshot of the enabled cleaning rules.
///
/// Constructed once from validated CLI arguments and shared read-only across
/// all tasks. The CLI rejects conflicting add/remove pairs before any
/// document is processed; the engine itself does not assume exclusivity and
/// resolves overlaps purely by rule order.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TransformOptions {
    /// Add the filename-derived password to the document metadata.
    pub add_pw_to_meta: bool,
    /// Add the metadata password to the filename (`{{password}}`).
    pub add_pw_to_filename: bool,
    /// Add the base filename to the document metadata as title.
    pub add_title_to_meta: bool,
    /// Use the metadata title as the output filename.
    pub use_title_for_filename: bool,
    /// Remove the password from the document metadata.
    pub remove_pw_from_meta: bool,
    /// Remove the password from the filename.
    pub remove_pw_from_filename: bool,
    /// Remove the title from the document metadata.
    pub remove_title_from_meta: bool,
}

impl TransformOptions {
    /// Returns true if no rule is enabled, i.e. running the engine would be
    /// the identity transform.
    pub fn is_noop(&self) -> bool {
        !(self.add_pw_to_meta
            || self.add_pw_to_filename
            || self.add_title_to_meta
            || self.use_title_for_filename
            || self.remove_pw_from_meta
            || self.remove_pw_from_filename
            || self.remove_title_from_meta)
    }
}

/// Result of applying the rule engine to one document.
#[derive(Debug)]
pub struct TransformOutcome {
    /// The document with metadata rules applied.
    pub doc: Document,
    /// The working password destined for the output filename.
    pub password: String,
    /// The working base name destined for the output filename.
    pub base_name: String,
    /// Non-fatal degradations, e.g. a candidate value rejected by filename
    /// validation. The original value is retained in that case.
    pub warnings: Vec<String>,
}

/// Applies the ordered rule set to one document.
///
/// `filename_password` and `base_name` are the values decoded from the input
/// filename. No rule fails the transform; invalid candidate values degrade to
/// "keep previous value" plus a warning.
pub fn apply(
    mut doc: Document,
    filename_password: &str,
    base_name: &str,
    options: &TransformOptions,
) -> TransformOutcome {
    let mut password = filename_password.to_string();
    let mut base_name = base_name.to_string();
    let mut warnings = Vec::new();

    // 1. Filename password into metadata.
    if options.add_pw_to_meta && !password.is_empty() {
        tracing::debug!(password = %password, "Adding password to metadata");
        doc.set_meta(META_PASSWORD, password.clone());
    }

    // 2. Drop metadata password.
    if options.remove_pw_from_meta {
        tracing::debug!("Removing password from metadata");
        doc.remove_meta(META_PASSWORD);
    }

    // 3. Base name into metadata as title.
    if options.add_title_to_meta {
        tracing::debug!(title = %base_name, "Adding title to metadata");
        doc.set_meta(META_TITLE, base_name.clone());
    }

    // 4. Drop metadata title.
    if options.remove_title_from_meta {
        tracing::debug!("Removing title from metadata");
        doc.remove_meta(META_TITLE);
    }

    // 5. Metadata title becomes the output filename, unless it cannot be one.
    if options.use_title_for_filename {
        if let Some(title) = doc.non_empty_meta(META_TITLE) {
            if is_valid_filename(title) {
                tracing::debug!(title = %title, "Using metadata title as filename");
                base_name = title.to_string();
            } else {
                warnings.push(format!("title '{title}' contains invalid characters"));
            }
        }
    }

    // 6. Metadata password becomes the filename password, same degradation.
    if options.add_pw_to_filename {
        if let Some(meta_password) = doc.non_empty_meta(META_PASSWORD) {
            if is_valid_filename(meta_password) {
                tracing::debug!("Adding metadata password to filename");
                password = meta_password.to_string();
            } else {
                warnings.push(format!(
                    "password '{meta_password}' contains invalid characters"
                ));
            }
        }
    }

    // 7. Applied last: overrides whatever rule 6 produced.
    if options.remove_pw_from_filename {
        tracing::debug!("Removing password from filename");
        password = String::new();
    }

    TransformOutcome {
        doc,
        password,
        base_name,
        warnings,
    }
}
