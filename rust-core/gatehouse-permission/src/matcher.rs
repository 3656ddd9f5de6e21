// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Permission matchers.
//!
//! Each matcher answers one question about a role and a computed
//! [`PermissionTarget`]. The engine walks [`MATCHERS`] in order and stops at
//! the first hit, so the order below is part of the decision semantics:
//!
//! 1. exact `verb:type`
//! 2. flipped `type:verb` / `singular:verb` (legacy role data)
//! 3. wildcard action `verb:*`
//! 4. wildcard resource `*:type`
//! 5. universal read `read:*` for read-like verbs
//! 6. owner-scoped `verb:own` / `verb:own_type`

use gatehouse_constitution::Role;
use gatehouse_core::Resource;

/// Verbs that count as reads for the universal-read shortcut.
pub const READ_VERBS: &[&str] = &["read", "get", "list", "search", "view"];

/// What a request needs, precomputed once per check.
#[derive(Debug, Clone)]
pub struct PermissionTarget<'a> {
    /// Role id of the caller.
    pub actor: &'a str,
    /// Verb half of `required`.
    pub verb: String,
    /// Resource-type half of `required`.
    pub target_type: String,
    /// The full `verb:type` permission string.
    pub required: String,
    /// The request's resource, for owner-scoped checks.
    pub resource: &'a Resource,
}

/// A named matching function.
#[derive(Clone, Copy)]
pub struct Matcher {
    pub name: &'static str,
    pub test: fn(&Role, &PermissionTarget<'_>) -> bool,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher").field("name", &self.name).finish()
    }
}

/// Matchers in evaluation order.
pub const MATCHERS: &[Matcher] = &[
    Matcher { name: "exact", test: exact },
    Matcher { name: "flipped", test: flipped },
    Matcher { name: "wildcard_action", test: wildcard_action },
    Matcher { name: "wildcard_resource", test: wildcard_resource },
    Matcher { name: "universal_read", test: universal_read },
    Matcher { name: "own_record", test: own_record },
];

/// `verb:type` present verbatim.
pub fn exact(role: &Role, target: &PermissionTarget<'_>) -> bool {
    role.has_permission(&target.required)
}

/// `type:verb`, or the singular `typ:verb` with one trailing `s` removed.
pub fn flipped(role: &Role, target: &PermissionTarget<'_>) -> bool {
    if target.target_type.is_empty() {
        return false;
    }
    let flipped = format!("{}:{}", target.target_type, target.verb);
    if role.has_permission(&flipped) {
        return true;
    }
    match target.target_type.strip_suffix('s') {
        Some(singular) if !singular.is_empty() => {
            role.has_permission(&format!("{}:{}", singular, target.verb))
        }
        _ => false,
    }
}

/// `verb:*`.
pub fn wildcard_action(role: &Role, target: &PermissionTarget<'_>) -> bool {
    role.has_permission(&format!("{}:*", target.verb))
}

/// `*:type`.
pub fn wildcard_resource(role: &Role, target: &PermissionTarget<'_>) -> bool {
    !target.target_type.is_empty() && role.has_permission(&format!("*:{}", target.target_type))
}

/// `read:*` grants every read-like verb.
pub fn universal_read(role: &Role, target: &PermissionTarget<'_>) -> bool {
    READ_VERBS.contains(&target.verb.as_str()) && role.has_permission("read:*")
}

/// `verb:own` or `verb:own_type`, when the resource names the caller.
pub fn own_record(role: &Role, target: &PermissionTarget<'_>) -> bool {
    let scoped = role.has_permission(&format!("{}:own", target.verb))
        || role.has_permission(&format!("{}:own_{}", target.verb, target.target_type));
    scoped && target.resource.encodes_actor(target.actor)
}
