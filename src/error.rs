//! Error types for nzb-cleaner operations.
//!
//! Defines error types for the major subsystems:
//! - Input discovery (path resolution, directory scanning)
//! - NZB document parsing and serialization
//! - Per-file processing inside the batch pipeline
//!
//! Discovery errors are fatal and abort the run before any file is touched;
//! task errors are confined to the file that raised them.

use thiserror::Error;

/// Errors that can occur while resolving the input path to a set of NZB files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("File or path '{0}' does not exist")]
    NotFound(String),

    #[error("Provided file '{0}' is not an NZB file")]
    NotAnNzbFile(String),

    #[error("No NZB files found in directory '{0}'")]
    EmptyDirectory(String),

    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while parsing or serializing an NZB document.
#[derive(Debug, Error)]
pub enum NzbError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed NZB document: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while processing a single file in the batch.
///
/// These are captured at the task boundary and never propagate to sibling
/// tasks or the process exit code.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Failed to read file '{filename}': {source}")]
    Read {
        filename: String,
        source: std::io::Error,
    },

    #[error("Failed to parse NZB file '{filename}': {source}")]
    Parse { filename: String, source: NzbError },

    #[error("Failed to generate new NZB file '{filename}': {source}")]
    Serialize { filename: String, source: NzbError },

    #[error("Failed to write new NZB file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}
