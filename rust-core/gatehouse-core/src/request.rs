// SPDX-License-Identifier: PMPL-1.0-or-later
//! Inbound request record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::{normalize_action, required_permission, ActionParts};
use crate::resource::Resource;

/// One call into the gateway. Lives only for the duration of `execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Role id of the caller.
    pub actor: String,
    /// Free-form action name (`create:candidates`, `create_candidates`, ...).
    pub action: String,
    /// Target resource.
    pub resource: Resource,
    /// Arbitrary payload; `null` when absent.
    #[serde(default)]
    pub data: Value,
    /// Optional session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl Request {
    /// Create a request with an empty payload.
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<Resource>,
    ) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            resource: resource.into(),
            data: Value::Null,
            session: None,
        }
    }

    /// Attach a payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Attach a session id.
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// The action in colon form.
    pub fn normalized_action(&self) -> String {
        normalize_action(&self.action)
    }

    /// Verb of the normalized action, lowercased.
    pub fn verb(&self) -> String {
        ActionParts::parse(&self.normalized_action())
            .verb
            .to_ascii_lowercase()
    }

    /// Resource type derived from the resource.
    pub fn resource_type(&self) -> &str {
        self.resource.resource_type()
    }

    /// The `verb:type` permission string the request needs.
    pub fn required_permission(&self) -> String {
        required_permission(&self.normalized_action(), self.resource_type())
    }

    /// Resource type named by the action, falling back to the resource's
    /// own type for a bare verb. This is the type the permission check and
    /// handler lookup use.
    pub fn target_type(&self) -> String {
        ActionParts::parse(&self.required_permission()).target
    }

    /// Whether the request addresses `resource_type`, either through its
    /// action or through its resource.
    pub fn targets(&self, resource_type: &str) -> bool {
        self.target_type() == resource_type || self.resource_type() == resource_type
    }

    /// Look up a top-level payload field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Why the request cannot enter the pipeline, if it cannot.
    pub fn malformed_reason(&self) -> Option<&'static str> {
        if self.actor.trim().is_empty() {
            Some("request is missing an actor")
        } else if self.action.trim().is_empty() {
            Some("request is missing an action")
        } else {
            None
        }
    }
}
