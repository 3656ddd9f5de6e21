// SPDX-License-Identifier: PMPL-1.0-or-later
//! Action normalization.
//!
//! Callers across the knowledge base name actions in incompatible shapes:
//! `create:candidates`, `create_candidates`, `candidate.delete`, or a bare
//! `read`. Permission strings are always `verb:resourceType`, so every action
//! is first normalized to colon form by an ordered list of normalizers. The
//! first normalizer that produces a value wins; the order is part of the
//! contract.

/// Verbs recognized inside compound legacy identifiers.
pub const RECOGNIZED_VERBS: &[&str] = &[
    "read", "create", "delete", "submit", "approve", "reject", "write",
];

/// Separators used by legacy action identifiers.
pub const LEGACY_SEPARATORS: &[char] = &['_', '.', '-', '/'];

/// A single normalization step. Returns `None` when it does not apply.
pub type Normalizer = fn(&str) -> Option<String>;

/// Normalizers in evaluation order.
pub const NORMALIZERS: &[(&str, Normalizer)] = &[
    ("colon_passthrough", colon_passthrough),
    ("recognized_verb", collapse_recognized_verb),
    ("first_separator", replace_first_separator),
];

/// Already colon-delimited: keep as is.
pub fn colon_passthrough(action: &str) -> Option<String> {
    action.contains(':').then(|| action.to_string())
}

/// Pull a recognized verb out of a compound identifier.
///
/// The resource part is the tokens after the verb; when the verb is the
/// last token (`candidate_delete`) the tokens before it are used instead.
pub fn collapse_recognized_verb(action: &str) -> Option<String> {
    let tokens: Vec<&str> = action
        .split(|c: char| LEGACY_SEPARATORS.contains(&c))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() < 2 {
        return None;
    }

    let position = tokens
        .iter()
        .position(|t| RECOGNIZED_VERBS.contains(&t.to_ascii_lowercase().as_str()))?;
    let verb = tokens[position].to_ascii_lowercase();

    let after = &tokens[position + 1..];
    let rest = if after.is_empty() {
        tokens[..position].join("_")
    } else {
        after.join("_")
    };
    Some(format!("{}:{}", verb, rest))
}

/// Replace the first legacy separator with `:`.
pub fn replace_first_separator(action: &str) -> Option<String> {
    let index = action.find(|c: char| LEGACY_SEPARATORS.contains(&c))?;
    let mut out = String::with_capacity(action.len());
    out.push_str(&action[..index]);
    out.push(':');
    out.push_str(&action[index + 1..]);
    Some(out)
}

/// Normalize an action to colon form. Bare words come back unchanged.
pub fn normalize_action(action: &str) -> String {
    let action = action.trim();
    NORMALIZERS
        .iter()
        .find_map(|(_, normalize)| normalize(action))
        .unwrap_or_else(|| action.to_string())
}

/// The permission string a request needs.
///
/// A normalized action that already names a resource (`verb:type`) is used
/// as is; otherwise the resource type is appended.
pub fn required_permission(normalized_action: &str, resource_type: &str) -> String {
    if normalized_action.contains(':') {
        normalized_action.to_string()
    } else {
        format!("{}:{}", normalized_action, resource_type)
    }
}

/// A `verb:target` pair split out of a permission string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParts {
    pub verb: String,
    pub target: String,
}

impl ActionParts {
    /// Split on the first `:`. A missing target becomes the empty string.
    pub fn parse(permission: &str) -> Self {
        match permission.split_once(':') {
            Some((verb, target)) => Self {
                verb: verb.to_string(),
                target: target.to_string(),
            },
            None => Self {
                verb: permission.to_string(),
                target: String::new(),
            },
        }
    }
}
