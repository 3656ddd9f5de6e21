// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The gateway: one choke point for every operation.
//
// Per call:
//
//   received -> malformed? -> permission -> rules -> lookup
//            -> pre hooks -> handler -> post hooks -> audit -> envelope
//
// `run` is the pipeline up to the audit step and returns a plain `Result`;
// `execute` wraps it so that every exit, including a caught panic, is
// audited exactly once.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use gatehouse_audit::{AuditEntry, AuditResult, AuditSink};
use gatehouse_constitution::ConstitutionSource;
use gatehouse_core::Request;
use gatehouse_permission::PermissionEngine;
use gatehouse_rules::{RuleValidator, ValidatorConfig};
use prometheus::Registry;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{GatewayError, HandlerError};
use crate::handler::{Handler, Plugin};
use crate::metrics::{GatewayMetrics, Outcome};
use crate::response::GatewayResponse;

/// Policy-gated dispatcher.
///
/// Populate handlers and plugins first, then share behind an `Arc`.
pub struct Gateway {
    engine: PermissionEngine,
    validator: RuleValidator,
    audit: Arc<dyn AuditSink>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    plugins: Vec<Arc<dyn Plugin>>,
    metrics: Option<GatewayMetrics>,
}

impl Gateway {
    /// Gateway over `source` writing to `audit`, with the default rule
    /// configuration.
    pub fn new(source: Arc<ConstitutionSource>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            engine: PermissionEngine::new(Arc::clone(&source)),
            validator: RuleValidator::with_constitution(ValidatorConfig::default(), source),
            audit,
            handlers: HashMap::new(),
            plugins: Vec::new(),
            metrics: None,
        }
    }

    /// Replace the rule validator configuration.
    pub fn with_validator_config(mut self, config: ValidatorConfig) -> Self {
        self.validator =
            RuleValidator::with_constitution(config, Arc::clone(self.engine.source()));
        self
    }

    /// Register Prometheus metrics.
    pub fn with_prometheus(mut self, registry: &Registry) -> Result<Self, prometheus::Error> {
        self.metrics = Some(GatewayMetrics::register(registry)?);
        Ok(self)
    }

    /// Bind `handler` to `action`. Fails if the action already has one.
    pub fn register<H>(&mut self, action: impl Into<String>, handler: H) -> Result<(), GatewayError>
    where
        H: Handler + 'static,
    {
        let action = action.into();
        if self.handlers.contains_key(&action) {
            return Err(GatewayError::DuplicateHandler(action));
        }
        debug!(action = %action, "handler registered");
        self.handlers.insert(action, Arc::new(handler));
        Ok(())
    }

    /// Append a plugin; hooks run in registration order.
    pub fn use_plugin<P>(&mut self, plugin: P)
    where
        P: Plugin + 'static,
    {
        debug!(plugin = %plugin.name(), "plugin installed");
        self.plugins.push(Arc::new(plugin));
    }

    /// Registered action names, sorted.
    pub fn registered_actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self.handlers.keys().cloned().collect();
        actions.sort();
        actions
    }

    /// Plugin names in hook order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Shared handle to the audit sink.
    pub fn audit(&self) -> Arc<dyn AuditSink> {
        Arc::clone(&self.audit)
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn validator(&self) -> &RuleValidator {
        &self.validator
    }

    pub fn source(&self) -> &Arc<ConstitutionSource> {
        self.engine.source()
    }

    pub fn metrics(&self) -> Option<&GatewayMetrics> {
        self.metrics.as_ref()
    }

    /// Run one request through the full pipeline.
    ///
    /// Never fails and never panics: every outcome is an envelope, and every
    /// call leaves exactly one audit row.
    #[instrument(skip(self, request), fields(actor = %request.actor, action = %request.action))]
    pub async fn execute(&self, request: Request) -> GatewayResponse {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let ctx = RequestContext::new(request_id, request, self.engine.source().snapshot());

        let result = self.run(&ctx).await;
        let elapsed = started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        self.record_audit(&ctx, &result, duration_ms).await;

        let outcome = Outcome::of(&result);
        if let Some(metrics) = &self.metrics {
            metrics.observe(outcome, elapsed.as_secs_f64());
        }

        match &result {
            Ok(_) => info!(
                request_id = %request_id,
                duration_ms,
                "request completed"
            ),
            Err(e) => warn!(
                request_id = %request_id,
                outcome = %outcome,
                status = e.status_code(),
                error = %e,
                "request rejected"
            ),
        }

        GatewayResponse::from_result(request_id, duration_ms, &result)
    }

    /// Everything up to the audit step.
    async fn run(&self, ctx: &RequestContext) -> Result<Value, GatewayError> {
        let request = &ctx.request;

        if let Some(reason) = request.malformed_reason() {
            return Err(GatewayError::Malformed(reason.to_string()));
        }

        let decision = self.engine.check_with(
            &ctx.constitution,
            &request.actor,
            &request.action,
            &request.resource,
        );
        if !decision.allowed {
            return Err(GatewayError::PermissionDenied {
                reason: decision.reason,
                required: decision.required,
            });
        }

        self.validator.enforce(request)?;

        let handler = self
            .lookup(ctx)
            .ok_or_else(|| GatewayError::HandlerNotFound(request.action.clone()))?;

        for plugin in &self.plugins {
            guarded(plugin.pre(ctx))
                .await
                .unwrap_or_else(|panic| Err(HandlerError::new(format!("pre hook panicked: {}", panic))))
                .map_err(|source| GatewayError::Plugin {
                    plugin: plugin.name().to_string(),
                    source,
                })?;
        }

        let mut result = guarded(handler.handle(ctx))
            .await
            .unwrap_or_else(|panic| {
                Err(HandlerError::new(format!("handler panicked: {}", panic)).with_code("HANDLER_PANIC"))
            })
            .map_err(GatewayError::Handler)?;

        for plugin in &self.plugins {
            guarded(plugin.post(ctx, &mut result))
                .await
                .unwrap_or_else(|panic| Err(HandlerError::new(format!("post hook panicked: {}", panic))))
                .map_err(|source| GatewayError::Plugin {
                    plugin: plugin.name().to_string(),
                    source,
                })?;
        }

        Ok(result)
    }

    /// Exact action first, then its colon form, then the `verb:type`
    /// permission string (so a bare `read` on `/recipes` finds
    /// `read:recipes`).
    fn lookup(&self, ctx: &RequestContext) -> Option<Arc<dyn Handler>> {
        self.handlers
            .get(&ctx.request.action)
            .or_else(|| self.handlers.get(&ctx.normalized_action))
            .or_else(|| self.handlers.get(&ctx.permission))
            .map(Arc::clone)
    }

    async fn record_audit(
        &self,
        ctx: &RequestContext,
        result: &Result<Value, GatewayError>,
        duration_ms: u64,
    ) {
        let request = &ctx.request;
        let status = if result.is_ok() {
            AuditResult::Success
        } else {
            AuditResult::Failure
        };

        let mut entry = AuditEntry::new(
            request.actor.clone(),
            request.action.clone(),
            request.resource.to_string(),
            status,
        )
        .with_id(ctx.request_id)
        .with_actor_context(ctx.actor_context())
        .with_payload(request.data.clone())
        .with_duration(duration_ms);

        if let Err(e) = result {
            entry = entry.with_error(e.to_string());
        }

        if let Err(e) = self.audit.record(entry).await {
            error!(
                request_id = %ctx.request_id,
                sink = %self.audit.name(),
                error = %e,
                "audit write failed"
            );
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("actions", &self.registered_actions())
            .field("plugins", &self.plugin_names())
            .field("audit", &self.audit.name())
            .finish()
    }
}

/// Await `fut`, turning a panic into its message.
async fn guarded<F, T>(fut: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
