// SPDX-License-Identifier: PMPL-1.0-or-later
//! Per-call context handed to handlers and plugins.

use std::sync::Arc;
use std::time::Instant;

use gatehouse_constitution::{Constitution, Role};
use gatehouse_core::{required_permission, Request};
use serde_json::{json, Value};
use uuid::Uuid;

/// Everything a handler may read about the call it serves.
///
/// `constitution` is the snapshot the permission check ran against, so a
/// reload mid-call does not change what the handler sees.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub request: Request,
    /// The action in colon form.
    pub normalized_action: String,
    /// `verb:type` string the permission check ran against.
    pub permission: String,
    pub constitution: Arc<Constitution>,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(request_id: Uuid, request: Request, constitution: Arc<Constitution>) -> Self {
        let normalized_action = request.normalized_action();
        let permission = required_permission(&normalized_action, request.resource_type());
        Self {
            request_id,
            request,
            normalized_action,
            permission,
            constitution,
            started_at: Instant::now(),
        }
    }

    pub fn actor(&self) -> &str {
        &self.request.actor
    }

    pub fn data(&self) -> &Value {
        &self.request.data
    }

    /// The caller's role in this call's constitution snapshot.
    pub fn role(&self) -> Option<&Role> {
        self.constitution.role(&self.request.actor)
    }

    /// Actor context recorded with the audit row.
    pub fn actor_context(&self) -> Value {
        json!({
            "role": self.role().map(|r| r.name.as_str()),
            "constitution_version": self.constitution.version,
            "session": self.request.session,
        })
    }
}
