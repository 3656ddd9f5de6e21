// SPDX-License-Identifier: PMPL-1.0-or-later
//! Server configuration, read from `GATEHOUSE_*` environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Runtime configuration for the `gatehouse` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Constitution document (JSON or YAML). Built-in default when unset.
    pub constitution_path: Option<PathBuf>,
    /// redb audit database. In-memory sink when unset.
    pub audit_path: Option<PathBuf>,
    /// Row limit for the in-memory sink. Unbounded when unset; a limit
    /// drops the oldest rows once reached.
    pub audit_capacity: Option<usize>,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            constitution_path: None,
            audit_path: None,
            audit_capacity: None,
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("GATEHOUSE_HOST") {
            config.host = host;
        }
        if let Some(port) = get("GATEHOUSE_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("GATEHOUSE_PORT: invalid port '{}'", port)))?;
        }
        if let Some(path) = get("GATEHOUSE_CONSTITUTION") {
            config.constitution_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get("GATEHOUSE_AUDIT_PATH") {
            config.audit_path = Some(PathBuf::from(path));
        }
        if let Some(capacity) = get("GATEHOUSE_AUDIT_CAPACITY") {
            let limit = capacity.trim().parse().map_err(|_| {
                ApiError::Config(format!("GATEHOUSE_AUDIT_CAPACITY: invalid number '{}'", capacity))
            })?;
            config.audit_capacity = Some(limit);
        }
        if let Some(flag) = get("GATEHOUSE_LOG_JSON") {
            config.log_json = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
