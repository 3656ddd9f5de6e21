// SPDX-License-Identifier: PMPL-1.0-or-later
//! Request targets.
//!
//! Callers name resources in two shapes: a path such as `/recipes/42`, or an
//! object `{"type": "recipes", "id": "42"}`. Both deserialize into
//! [`Resource`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Resource type reported when neither shape carries one.
pub const UNKNOWN_RESOURCE_TYPE: &str = "unknown";

/// The object or collection a request targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    /// Path form: `/type/id[/...]`.
    Path(String),
    /// Object form with an explicit type and optional id.
    Typed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

/// Accept string or numeric ids.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl Resource {
    /// Build a path resource.
    pub fn path(path: impl Into<String>) -> Self {
        Resource::Path(path.into())
    }

    /// Build a typed resource.
    pub fn typed(kind: impl Into<String>, id: Option<String>) -> Self {
        Resource::Typed {
            kind: kind.into(),
            id,
        }
    }

    /// Non-empty path segments, in order.
    fn segments(&self) -> Vec<&str> {
        match self {
            Resource::Path(path) => path.split('/').filter(|s| !s.is_empty()).collect(),
            Resource::Typed { kind, id } => {
                let mut out = Vec::with_capacity(2);
                if !kind.is_empty() {
                    out.push(kind.as_str());
                }
                if let Some(id) = id.as_deref().filter(|id| !id.is_empty()) {
                    out.push(id);
                }
                out
            }
        }
    }

    /// The resource type: first path segment, or the `type` field, else
    /// [`UNKNOWN_RESOURCE_TYPE`].
    pub fn resource_type(&self) -> &str {
        match self {
            Resource::Path(path) => path
                .split('/')
                .find(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_RESOURCE_TYPE),
            Resource::Typed { kind, .. } if !kind.is_empty() => kind,
            Resource::Typed { .. } => UNKNOWN_RESOURCE_TYPE,
        }
    }

    /// The resource id: second path segment, or the `id` field.
    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::Path(_) => self.segments().get(1).copied(),
            Resource::Typed { id, .. } => id.as_deref().filter(|id| !id.is_empty()),
        }
    }

    /// Whether anything after the type segment names `actor`.
    ///
    /// Used by owner-scoped permissions such as `read:own`.
    pub fn encodes_actor(&self, actor: &str) -> bool {
        if actor.is_empty() {
            return false;
        }
        self.segments().iter().skip(1).any(|segment| *segment == actor)
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Path(path) => write!(f, "{}", path),
            Resource::Typed { kind, id: Some(id) } => write!(f, "/{}/{}", kind, id),
            Resource::Typed { kind, id: None } => write!(f, "/{}", kind),
        }
    }
}

impl From<&str> for Resource {
    fn from(path: &str) -> Self {
        Resource::Path(path.to_string())
    }
}

impl From<String> for Resource {
    fn from(path: String) -> Self {
        Resource::Path(path)
    }
}
