// SPDX-License-Identifier: PMPL-1.0-or-later
//! Constitution loading from JSON or YAML.

use std::path::Path;

use tracing::debug;

use crate::error::ConstitutionError;
use crate::model::Constitution;

/// Serialization format of a constitution document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension. Anything but `.yaml`/`.yml`
    /// is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Parse and validate a document.
pub fn parse(text: &str, format: DocumentFormat) -> Result<Constitution, ConstitutionError> {
    let constitution: Constitution = match format {
        DocumentFormat::Json => serde_json::from_str(text)?,
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
    };
    constitution.validate()?;
    Ok(constitution)
}

/// Read, parse, and validate the document at `path`.
pub fn load_file(path: &Path) -> Result<Constitution, ConstitutionError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConstitutionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let constitution = parse(&text, DocumentFormat::from_path(path))?;
    debug!(
        path = %path.display(),
        version = %constitution.version,
        roles = constitution.roles.len(),
        "parsed constitution"
    );
    Ok(constitution)
}
