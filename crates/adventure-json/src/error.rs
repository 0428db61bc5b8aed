//! JSON and save codec error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("{type_name} json is missing")]
    MissingDocument { type_name: &'static str },

    #[error("{type_name} json has no \"{key}\" field")]
    MissingField { type_name: &'static str, key: String },

    #[error("{type_name} json field \"{key}\" is invalid: {reason}")]
    InvalidField {
        type_name: &'static str,
        key: String,
        reason: String,
    },

    #[error("invalid version label: {0:?}")]
    InvalidVersion(String),

    #[error("JSON syntax error: {0}")]
    Syntax(#[from] serde_json::Error),
}

impl JsonError {
    pub fn invalid(type_name: &'static str, key: &str, reason: impl ToString) -> Self {
        Self::InvalidField {
            type_name,
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line} is not valid JSON: {source}")]
    Syntax {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("file has no document {index}")]
    MissingDocument { index: usize },
}

impl CodecError {
    /// Whether the file (or its folder) simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::FolderNotFound(_))
    }
}
