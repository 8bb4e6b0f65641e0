//! Error types for the registry loader

use std::path::PathBuf;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Registry load errors
///
/// Only mapping-document problems abort a load. Everything below that level
/// (unparsable documents, unresolvable references, missing fields) degrades
/// into health flags on the loaded graph instead of surfacing here.
#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("registry mapping not found at: {0}")]
    MappingNotFound(PathBuf),

    #[error("registry mapping is missing its \"elements\" section")]
    MissingElements,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
