// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in gateway actions.
//
// Administrative operations are ordinary gateway handlers, so reloading the
// constitution or reading the audit trail is permission-checked and audited
// like any other call.

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_audit::{AuditQuery, AuditSink};
use gatehouse_constitution::{ConstitutionError, ConstitutionSource};
use gatehouse_gateway::{Handler, HandlerError, RequestContext};
use serde_json::{json, Value};
use tracing::info;

pub const RELOAD_CONSTITUTION: &str = "reload:constitution";
pub const READ_AUDIT_LOGS: &str = "read:audit_logs";

/// Re-read the constitution from its backing file.
pub struct ReloadConstitution {
    source: Arc<ConstitutionSource>,
}

impl ReloadConstitution {
    pub fn new(source: Arc<ConstitutionSource>) -> Self {
        Self { source }
    }
}

fn reload_error(err: ConstitutionError) -> HandlerError {
    let (status, code) = match &err {
        ConstitutionError::NoBackingFile => (409, "NO_BACKING_FILE"),
        ConstitutionError::Parse(_) | ConstitutionError::Invalid(_) => (422, "INVALID_CONSTITUTION"),
        ConstitutionError::Io { .. } => (500, "CONSTITUTION_IO"),
    };
    HandlerError::new(err.to_string())
        .with_status(status)
        .with_code(code)
}

#[async_trait]
impl Handler for ReloadConstitution {
    async fn handle(&self, ctx: &RequestContext) -> Result<Value, HandlerError> {
        let constitution = self.source.reload().map_err(reload_error)?;
        let generation = self.source.generation();
        info!(
            actor = %ctx.actor(),
            version = %constitution.version,
            generation,
            "constitution reloaded on request"
        );
        Ok(json!({
            "version": constitution.version,
            "generation": generation,
            "roles": constitution.role_ids(),
        }))
    }
}

/// Query or aggregate the audit trail.
///
/// The payload is an `AuditQuery`; `"view": "stats"` returns the aggregate
/// since `since` instead of rows.
pub struct ReadAuditLogs {
    sink: Arc<dyn AuditSink>,
}

impl ReadAuditLogs {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Handler for ReadAuditLogs {
    async fn handle(&self, ctx: &RequestContext) -> Result<Value, HandlerError> {
        let data = ctx.data();
        let query: AuditQuery = if data.is_null() {
            AuditQuery::default()
        } else {
            serde_json::from_value(data.clone())
                .map_err(|e| HandlerError::bad_request(format!("invalid audit query: {}", e)))?
        };

        let internal = |e: gatehouse_audit::AuditError| {
            HandlerError::new(e.to_string()).with_code("AUDIT_UNAVAILABLE")
        };

        if data.get("view").and_then(Value::as_str) == Some("stats") {
            let stats = self.sink.stats(query.since).await.map_err(internal)?;
            return serde_json::to_value(stats).map_err(|e| HandlerError::new(e.to_string()));
        }

        let rows = self.sink.query(&query).await.map_err(internal)?;
        Ok(json!({ "count": rows.len(), "entries": rows }))
    }
}
