// SPDX-License-Identifier: PMPL-1.0-or-later
//! Constitution error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or reloading a constitution.
#[derive(Error, Debug)]
pub enum ConstitutionError {
    #[error("failed to read constitution at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse constitution: {0}")]
    Parse(String),

    #[error("invalid constitution: {0}")]
    Invalid(String),

    #[error("constitution has no backing file to reload from")]
    NoBackingFile,
}

impl From<serde_json::Error> for ConstitutionError {
    fn from(err: serde_json::Error) -> Self {
        ConstitutionError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConstitutionError {
    fn from(err: serde_yaml::Error) -> Self {
        ConstitutionError::Parse(err.to_string())
    }
}
