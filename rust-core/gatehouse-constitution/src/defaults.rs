// SPDX-License-Identifier: PMPL-1.0-or-later
//! Built-in constitution used when no document is configured.
//!
//! Roles:
//! - `admin`, `developer_admin`: full access (`*`).
//! - `contributor`: read everything, author candidates and recipes.
//! - `visitor`: read recipes and guard rules, read own sessions.
//! - `external_agent`: read everything, submit candidates only.

use crate::model::{Constitution, Priority, Role, RuleMeta};

/// Version string of the built-in document.
pub const DEFAULT_VERSION: &str = "builtin-1";

fn priority(id: u8, name: &str, description: &str) -> Priority {
    Priority {
        id,
        name: name.to_string(),
        description: Some(description.to_string()),
    }
}

fn rule(id: &str, priority: u8, description: &str) -> RuleMeta {
    RuleMeta {
        id: id.to_string(),
        priority: Some(priority),
        description: description.to_string(),
    }
}

impl Default for Constitution {
    fn default() -> Self {
        let mut visitor = Role::new(
            "visitor",
            "Visitor",
            &["read:recipes", "read:guard_rules", "read:own"],
        );
        visitor.constraints.push("read_only".to_string());

        let mut agent = Role::new(
            "external_agent",
            "External AI agent",
            &["read:*", "create:candidates", "submit:candidates"],
        );
        agent.constraints.push("no_direct_recipe_creation".to_string());
        agent.required_capabilities.push("mcp".to_string());

        Self {
            version: DEFAULT_VERSION.to_string(),
            priorities: vec![
                priority(1, "data_integrity", "Never corrupt or silently lose knowledge"),
                priority(2, "human_oversight", "Humans stay in the loop for publishing"),
                priority(3, "ai_transparency", "AI contributions explain themselves"),
            ],
            rules: vec![
                rule("candidate_code_required", 1, "Candidates must carry code"),
                rule("destructive_confirm", 1, "Destructive operations require confirmation"),
                rule("ai_no_direct_recipe", 2, "AI actors cannot create recipes directly"),
                rule("batch_authorized", 2, "Batch operations require authorization"),
                rule("reasoning_complete", 3, "Reasoning, when given, must be complete"),
                rule("guard_rule_source", 3, "Guard rules must reference their source recipe"),
            ],
            roles: vec![
                Role::new("admin", "Administrator", &["*"]),
                Role::new("developer_admin", "Developer administrator", &["*"]),
                Role::new(
                    "contributor",
                    "Contributor",
                    &[
                        "read:*",
                        "create:candidates",
                        "submit:candidates",
                        "create:recipes",
                        "write:own",
                    ],
                ),
                visitor,
                agent,
            ],
        }
    }
}
