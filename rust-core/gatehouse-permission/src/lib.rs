// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Gatehouse permission engine.
//!
//! Decides whether an actor may perform an action on a resource, given the
//! roles in the loaded constitution. Evaluation order, first match wins:
//!
//! 1. Resolve the role; unknown actors are denied.
//! 2. The literal wildcard `*` allows everything.
//! 3. Derive the resource type from the resource (`unknown` if absent).
//! 4. Normalize the action to colon form ([`gatehouse_core::normalize_action`]).
//! 5. Compute the required permission string.
//! 6. Walk the ordered [`matcher::MATCHERS`].
//! 7. Otherwise deny, naming the required permission in the reason.
//!
//! The engine is pure: no I/O, no mutation. Denial is a return value.

pub mod matcher;

use std::sync::Arc;

use gatehouse_constitution::{Constitution, ConstitutionSource, Role};
use gatehouse_core::{normalize_action, required_permission, ActionParts, Resource};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use matcher::{Matcher, PermissionTarget, MATCHERS, READ_VERBS};

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub reason: String,
    /// The computed `verb:type` string, when the check got that far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
}

impl PermissionDecision {
    fn allow(reason: impl Into<String>, required: Option<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            required,
        }
    }

    fn deny(reason: impl Into<String>, required: Option<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            required,
        }
    }
}

/// Evaluate a check against an explicit role.
///
/// `role` is `None` when the actor does not resolve to a role.
pub fn evaluate(
    role: Option<&Role>,
    actor: &str,
    action: &str,
    resource: &Resource,
) -> PermissionDecision {
    let role = match role {
        Some(role) => role,
        None => return PermissionDecision::deny(format!("unknown role '{}'", actor), None),
    };

    if role.is_superuser() {
        return PermissionDecision::allow("wildcard permission '*'", None);
    }

    let resource_type = resource.resource_type();
    let normalized = normalize_action(action);
    let required = required_permission(&normalized, resource_type);
    let parts = ActionParts::parse(&required);

    let target = PermissionTarget {
        actor,
        verb: parts.verb,
        target_type: parts.target,
        required: required.clone(),
        resource,
    };

    match MATCHERS.iter().find(|m| (m.test)(role, &target)) {
        Some(matcher) => PermissionDecision::allow(
            format!("'{}' granted by {} match", required, matcher.name),
            Some(required),
        ),
        None => PermissionDecision::deny(
            format!("role '{}' lacks permission '{}'", role.id, required),
            Some(required),
        ),
    }
}

/// Permission engine bound to a constitution source.
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    source: Arc<ConstitutionSource>,
}

impl PermissionEngine {
    pub fn new(source: Arc<ConstitutionSource>) -> Self {
        Self { source }
    }

    /// The constitution this engine reads roles from.
    pub fn source(&self) -> &Arc<ConstitutionSource> {
        &self.source
    }

    /// Check against the current constitution snapshot.
    pub fn check(&self, actor: &str, action: &str, resource: &Resource) -> PermissionDecision {
        let snapshot = self.source.snapshot();
        self.check_with(&snapshot, actor, action, resource)
    }

    /// Check against a specific constitution snapshot.
    pub fn check_with(
        &self,
        constitution: &Constitution,
        actor: &str,
        action: &str,
        resource: &Resource,
    ) -> PermissionDecision {
        let decision = evaluate(constitution.role(actor), actor, action, resource);
        debug!(
            actor = %actor,
            action = %action,
            resource = %resource,
            allowed = decision.allowed,
            reason = %decision.reason,
            "permission check"
        );
        decision
    }
}
