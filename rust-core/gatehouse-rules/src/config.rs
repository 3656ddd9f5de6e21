// SPDX-License-Identifier: PMPL-1.0-or-later
//! Validator configuration.
//!
//! The sets of AI actors and destructive keywords are expected to grow, so
//! they live here rather than inside the rules.

use serde::{Deserialize, Serialize};

/// Classification inputs shared by several rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Actor ids that are always treated as automated.
    pub ai_actors: Vec<String>,
    /// Actor id prefixes that mark an automated actor.
    pub ai_actor_prefixes: Vec<String>,
    /// Actor id suffixes that mark an automated actor.
    pub ai_actor_suffixes: Vec<String>,
    /// Substrings of an action name that make it destructive.
    pub destructive_keywords: Vec<String>,
    /// Resource types that hold guard rules.
    pub guard_rule_types: Vec<String>,
}

impl ValidatorConfig {
    /// Whether `actor` is an automated/AI actor.
    pub fn is_ai_actor(&self, actor: &str) -> bool {
        let actor = actor.trim().to_ascii_lowercase();
        if actor.is_empty() {
            return false;
        }
        self.ai_actors.iter().any(|a| a.eq_ignore_ascii_case(&actor))
            || self.ai_actor_prefixes.iter().any(|p| actor.starts_with(p.as_str()))
            || self.ai_actor_suffixes.iter().any(|s| actor.ends_with(s.as_str()))
    }

    /// Whether `action` names a destructive operation.
    pub fn is_destructive_action(&self, action: &str) -> bool {
        let action = action.to_ascii_lowercase();
        self.destructive_keywords
            .iter()
            .any(|k| action.contains(k.as_str()))
    }

    /// Whether `resource_type` holds guard rules.
    pub fn is_guard_rule_type(&self, resource_type: &str) -> bool {
        self.guard_rule_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(resource_type))
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            ai_actors: vec![
                "external_agent".to_string(),
                "ai_assistant".to_string(),
                "mcp_agent".to_string(),
            ],
            ai_actor_prefixes: vec!["ai_".to_string()],
            ai_actor_suffixes: vec!["_agent".to_string()],
            destructive_keywords: vec!["delete".to_string(), "drop".to_string()],
            guard_rule_types: vec![
                "guard_rules".to_string(),
                "guard-rules".to_string(),
                "guardrules".to_string(),
                "guards".to_string(),
            ],
        }
    }
}
