// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Constitution document model.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConstitutionError;

/// A rule priority group. Lower `id` means higher priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub id: u8,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Descriptive metadata for one governance rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    pub description: String,
}

/// A role definition.
///
/// Permission strings are `verb:resourceType` or one of the wildcard forms
/// `*`, `verb:*`, `*:resourceType`. Entries are kept in authoring order and
/// may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default, alias = "requiredCapabilities")]
    pub required_capabilities: Vec<String>,
}

impl Role {
    /// Create a role with the given permissions and no constraints.
    pub fn new(id: impl Into<String>, name: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            constraints: Vec::new(),
            required_capabilities: Vec::new(),
        }
    }

    /// Literal membership test on the permission list.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Whether the role holds the full-admin wildcard `*`.
    pub fn is_superuser(&self) -> bool {
        self.has_permission("*")
    }
}

/// The whole constitution document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constitution {
    pub version: String,
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub rules: Vec<RuleMeta>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Constitution {
    /// Look up a role by id.
    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Look up rule metadata by id.
    pub fn rule(&self, id: &str) -> Option<&RuleMeta> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Role ids in document order.
    pub fn role_ids(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.id.as_str()).collect()
    }

    /// Structural checks applied on every load.
    pub fn validate(&self) -> Result<(), ConstitutionError> {
        if self.version.trim().is_empty() {
            return Err(ConstitutionError::Invalid("missing version".to_string()));
        }

        let mut seen = HashSet::new();
        for role in &self.roles {
            if role.id.trim().is_empty() {
                return Err(ConstitutionError::Invalid(format!(
                    "role '{}' has an empty id",
                    role.name
                )));
            }
            if !seen.insert(role.id.as_str()) {
                return Err(ConstitutionError::Invalid(format!(
                    "duplicate role id '{}'",
                    role.id
                )));
            }
        }

        let mut priority_ids = HashSet::new();
        for priority in &self.priorities {
            if priority.id == 0 {
                return Err(ConstitutionError::Invalid(format!(
                    "priority '{}' must have an id of at least 1",
                    priority.name
                )));
            }
            if !priority_ids.insert(priority.id) {
                return Err(ConstitutionError::Invalid(format!(
                    "duplicate priority id {}",
                    priority.id
                )));
            }
        }

        for rule in &self.rules {
            if let Some(p) = rule.priority {
                if !self.priorities.is_empty() && !priority_ids.contains(&p) {
                    return Err(ConstitutionError::Invalid(format!(
                        "rule '{}' references unknown priority {}",
                        rule.id, p
                    )));
                }
            }
        }

        Ok(())
    }
}
