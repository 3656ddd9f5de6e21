// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Governance rules.
//!
//! Every rule is a plain function from a request to an optional failure
//! detail. Type-scoped rules match on the type the action names as well as
//! the resource's own type, so `create:recipes` against a `drafts` resource
//! is still a recipe creation. [`RULES`] lists them grouped by priority; all of them run on every
//! validation.
//!
//! | Priority | Rule | Requirement |
//! |---|---|---|
//! | 1 | `candidate_code_required` | `create` on `candidates` carries `data.code` |
//! | 1 | `destructive_confirm` | destructive actions carry `data.confirmed == true` |
//! | 2 | `ai_no_direct_recipe` | AI actors never `create` on `recipes` |
//! | 2 | `batch_authorized` | `batch_*` actions carry `data.authorized == true` |
//! | 3 | `reasoning_complete` | `data.reasoning`, if present, is complete |
//! | 3 | `guard_rule_source` | new guard rules carry `data.source_recipe_id` |

use gatehouse_core::Request;
use serde_json::Value;

use crate::config::ValidatorConfig;

/// Fields a `data.reasoning` object must fill.
pub const REASONING_FIELDS: &[&str] = &[
    "whyStandard",
    "sources",
    "qualitySignals",
    "alternatives",
    "confidence",
];

/// A rule check. Returns the failure detail when the request violates it.
pub type RuleCheck = fn(&Request, &ValidatorConfig) -> Option<String>;

/// One governance rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    /// 1 = highest.
    pub priority: u8,
    /// Default description when the constitution document does not carry one.
    pub summary: &'static str,
    pub check: RuleCheck,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

/// All rules, ordered by priority.
pub const RULES: &[Rule] = &[
    Rule {
        id: "candidate_code_required",
        priority: 1,
        summary: "Candidates must carry code",
        check: candidate_code_required,
    },
    Rule {
        id: "destructive_confirm",
        priority: 1,
        summary: "Destructive operations require confirmation",
        check: destructive_confirm,
    },
    Rule {
        id: "ai_no_direct_recipe",
        priority: 2,
        summary: "AI actors cannot create recipes directly",
        check: ai_no_direct_recipe,
    },
    Rule {
        id: "batch_authorized",
        priority: 2,
        summary: "Batch operations require authorization",
        check: batch_authorized,
    },
    Rule {
        id: "reasoning_complete",
        priority: 3,
        summary: "Reasoning, when given, must be complete",
        check: reasoning_complete,
    },
    Rule {
        id: "guard_rule_source",
        priority: 3,
        summary: "Guard rules must reference their source recipe",
        check: guard_rule_source,
    },
];

/// Whether a JSON value counts as present and non-empty.
pub fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => true,
    }
}

fn is_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Whether the request's action is destructive under `config`.
pub fn is_destructive_operation(request: &Request, config: &ValidatorConfig) -> bool {
    config.is_destructive_action(&request.action)
}

/// Whether `actor` is automated/AI under `config`.
pub fn is_ai_actor(actor: &str, config: &ValidatorConfig) -> bool {
    config.is_ai_actor(actor)
}

/// Whether the action is a `batch_*` operation, in either the bare or the
/// colon-delimited form.
pub fn is_batch_operation(request: &Request) -> bool {
    request
        .action
        .to_ascii_lowercase()
        .split(':')
        .any(|segment| segment.starts_with("batch_"))
}

pub fn candidate_code_required(request: &Request, _config: &ValidatorConfig) -> Option<String> {
    if request.verb() != "create" || !request.targets("candidates") {
        return None;
    }
    (!is_filled(request.field("code")))
        .then(|| "creating a candidate requires non-empty data.code".to_string())
}

pub fn destructive_confirm(request: &Request, config: &ValidatorConfig) -> Option<String> {
    if !is_destructive_operation(request, config) || is_true(request.field("confirmed")) {
        return None;
    }
    Some(format!(
        "destructive action '{}' requires data.confirmed = true",
        request.action
    ))
}

pub fn ai_no_direct_recipe(request: &Request, config: &ValidatorConfig) -> Option<String> {
    let direct_create = request.verb() == "create" && request.targets("recipes");
    (direct_create && is_ai_actor(&request.actor, config)).then(|| {
        format!(
            "AI actor '{}' cannot create recipes directly; submit a candidate instead",
            request.actor
        )
    })
}

pub fn batch_authorized(request: &Request, _config: &ValidatorConfig) -> Option<String> {
    if !is_batch_operation(request) || is_true(request.field("authorized")) {
        return None;
    }
    Some(format!(
        "batch action '{}' requires data.authorized = true",
        request.action
    ))
}

pub fn reasoning_complete(request: &Request, _config: &ValidatorConfig) -> Option<String> {
    let reasoning = match request.field("reasoning") {
        None | Some(Value::Null) => return None,
        Some(reasoning) => reasoning,
    };
    let missing: Vec<&str> = REASONING_FIELDS
        .iter()
        .copied()
        .filter(|field| !is_filled(reasoning.get(*field)))
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!(
            "data.reasoning is incomplete, missing: {}",
            missing.join(", ")
        ))
    }
}

pub fn guard_rule_source(request: &Request, config: &ValidatorConfig) -> Option<String> {
    let guard_rule = config.is_guard_rule_type(&request.target_type())
        || config.is_guard_rule_type(request.resource_type());
    if request.verb() != "create" || !guard_rule {
        return None;
    }
    (!is_filled(request.field("source_recipe_id")))
        .then(|| "creating a guard rule requires data.source_recipe_id".to_string())
}
