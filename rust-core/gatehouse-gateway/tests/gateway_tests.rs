// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end tests of the gateway pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_audit::{AuditQuery, AuditResult, AuditSink, InMemoryAuditSink};
use gatehouse_constitution::{Constitution, ConstitutionSource, Role};
use gatehouse_core::{Request, Resource};
use gatehouse_gateway::{
    handler_fn, Gateway, Handler, HandlerError, Outcome, Plugin, RequestContext,
};
use prometheus::Registry;
use serde_json::{json, Value};

fn builtin_gateway() -> (Gateway, InMemoryAuditSink) {
    let sink = InMemoryAuditSink::new(1_000);
    let gateway = Gateway::new(Arc::new(ConstitutionSource::builtin()), Arc::new(sink.clone()));
    (gateway, sink)
}

fn echo() -> impl Handler {
    handler_fn(|ctx: RequestContext| async move {
        Ok(json!({ "action": ctx.normalized_action, "data": ctx.request.data }))
    })
}

/// Counts calls so tests can tell whether dispatch happened.
struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl Handler for Counting {
    async fn handle(&self, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"ok": true}))
    }
}

struct Failing;

#[async_trait]
impl Handler for Failing {
    async fn handle(&self, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        Err(HandlerError::new("storage offline").with_status(503).with_code("UNAVAILABLE"))
    }
}

struct Panicking;

#[async_trait]
impl Handler for Panicking {
    async fn handle(&self, _ctx: &RequestContext) -> Result<Value, HandlerError> {
        panic!("index out of range");
    }
}

/// Records hook order into a shared log.
struct Tracer {
    name: &'static str,
    log: Arc<std::sync::Mutex<Vec<String>>>,
}

#[async_trait]
impl Plugin for Tracer {
    fn name(&self) -> &str {
        self.name
    }

    async fn pre(&self, _ctx: &RequestContext) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push(format!("pre:{}", self.name));
        Ok(())
    }

    async fn post(&self, _ctx: &RequestContext, result: &mut Value) -> Result<(), HandlerError> {
        self.log.lock().unwrap().push(format!("post:{}", self.name));
        if let Some(obj) = result.as_object_mut() {
            obj.insert(format!("seen_by_{}", self.name), json!(true));
        }
        Ok(())
    }
}

struct Blocking;

#[async_trait]
impl Plugin for Blocking {
    fn name(&self) -> &str {
        "maintenance"
    }

    async fn pre(&self, _ctx: &RequestContext) -> Result<(), HandlerError> {
        Err(HandlerError::new("read-only maintenance window"))
    }
}

struct RateLimit;

#[async_trait]
impl Plugin for RateLimit {
    fn name(&self) -> &str {
        "rate_limit"
    }

    async fn pre(&self, _ctx: &RequestContext) -> Result<(), HandlerError> {
        Err(HandlerError::new("slow down").with_status(429).with_code("RATE_LIMITED"))
    }
}

#[tokio::test]
async fn test_completed_call() {
    let (mut gw, sink) = builtin_gateway();
    gw.register("create:candidates", echo()).unwrap();

    let resp = gw
        .execute(
            Request::new("contributor", "create:candidates", "/candidates")
                .with_data(json!({"code": "fn f() {}"})),
        )
        .await;

    assert!(resp.success, "{:?}", resp.error);
    assert_eq!(resp.status_code(), 200);
    assert_eq!(resp.data.as_ref().unwrap()["action"], "create:candidates");

    let rows = sink.query(&AuditQuery::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].result, AuditResult::Success);
    assert_eq!(rows[0].payload_snapshot["code"], "fn f() {}");
    assert!(rows[0].duration_ms.is_some());
}

#[tokio::test]
async fn test_denied_call_never_dispatches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (mut gw, sink) = builtin_gateway();
    gw.register("delete:recipes", Counting(Arc::clone(&calls))).unwrap();

    let resp = gw
        .execute(
            Request::new("visitor", "delete:recipes", "/recipes/1")
                .with_data(json!({"confirmed": true})),
        )
        .await;

    assert!(!resp.success);
    assert_eq!(resp.status_code(), 403);
    assert_eq!(resp.error_code(), Some("PERMISSION_DENIED"));
    assert!(resp.error.unwrap().message.contains("delete:recipes"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let rows = sink.query(&AuditQuery::new()).await.unwrap();
    assert_eq!(rows[0].result, AuditResult::Failure);
    assert!(rows[0].error_message.as_deref().unwrap().contains("permission denied"));
}

#[tokio::test]
async fn test_rule_violation_never_dispatches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (mut gw, _) = builtin_gateway();
    gw.register("delete:candidates", Counting(Arc::clone(&calls))).unwrap();

    let req = Request::new("developer_admin", "delete:candidates", "/candidates/1")
        .with_data(json!({}));
    let resp = gw.execute(req.clone()).await;

    assert_eq!(resp.status_code(), 400);
    assert_eq!(resp.error_code(), Some("CONSTITUTION_VIOLATION"));
    let details = resp.error.unwrap().details.unwrap();
    assert_eq!(details.as_array().unwrap().len(), 1);
    assert_eq!(details[0]["rule_id"], "destructive_confirm");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let resp = gw.execute(req.with_data(json!({"confirmed": true}))).await;
    assert!(resp.success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ai_actor_blocked_even_with_wildcard() {
    let doc = Constitution {
        version: "agents".into(),
        priorities: vec![],
        rules: vec![],
        roles: vec![Role::new("ai_curator", "Curator bot", &["*"])],
    };
    let sink = InMemoryAuditSink::new(10);
    let mut gw = Gateway::new(
        Arc::new(ConstitutionSource::from_document(doc).unwrap()),
        Arc::new(sink),
    );
    gw.register("create:recipes", echo()).unwrap();

    let resp = gw
        .execute(Request::new("ai_curator", "create:recipes", "/recipes"))
        .await;
    assert_eq!(resp.status_code(), 400);
    assert!(resp.error.unwrap().message.contains("ai_no_direct_recipe"));
}

#[tokio::test]
async fn test_ai_recipe_rule_follows_action_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let doc = Constitution {
        version: "agents".into(),
        priorities: vec![],
        rules: vec![],
        roles: vec![Role::new("ai_curator", "Curator bot", &["*"])],
    };
    let sink = InMemoryAuditSink::new(10);
    let mut gw = Gateway::new(
        Arc::new(ConstitutionSource::from_document(doc).unwrap()),
        Arc::new(sink.clone()),
    );
    gw.register("create:recipes", Counting(Arc::clone(&calls))).unwrap();

    let resp = gw
        .execute(Request::new("ai_curator", "create:recipes", Resource::typed("drafts", None)))
        .await;
    assert_eq!(resp.status_code(), 400);
    assert_eq!(resp.error_code(), Some("CONSTITUTION_VIOLATION"));
    assert!(resp.error.unwrap().message.contains("ai_no_direct_recipe"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let rows = sink.query(&AuditQuery::new()).await.unwrap();
    assert_eq!(rows[0].result, AuditResult::Failure);
}

#[tokio::test]
async fn test_candidate_rule_follows_action_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (mut gw, _) = builtin_gateway();
    gw.register("create:candidates", Counting(Arc::clone(&calls))).unwrap();

    let resp = gw
        .execute(Request::new("contributor", "create:candidates", "/x").with_data(json!({})))
        .await;
    assert_eq!(resp.status_code(), 400);
    let details = resp.error.unwrap().details.unwrap();
    assert_eq!(details[0]["rule_id"], "candidate_code_required");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let resp = gw
        .execute(
            Request::new("contributor", "create:candidates", "/x")
                .with_data(json!({"code": "fn f() {}"})),
        )
        .await;
    assert!(resp.success, "{:?}", resp.error);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unregistered_action_is_404() {
    let (gw, sink) = builtin_gateway();
    let resp = gw
        .execute(Request::new("admin", "read:recipes", "/recipes"))
        .await;
    assert_eq!(resp.status_code(), 404);
    assert_eq!(resp.error_code(), Some("HANDLER_NOT_FOUND"));
    assert_eq!(sink.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_legacy_action_reaches_colon_handler() {
    let (mut gw, _) = builtin_gateway();
    gw.register("create:candidates", echo()).unwrap();

    let resp = gw
        .execute(
            Request::new("contributor", "create_candidates", "/candidates")
                .with_data(json!({"code": "x"})),
        )
        .await;
    assert!(resp.success, "{:?}", resp.error);
    assert_eq!(resp.data.unwrap()["action"], "create:candidates");
}

#[tokio::test]
async fn test_exact_registration_wins() {
    let (mut gw, _) = builtin_gateway();
    gw.register("create:candidates", handler_fn(|_| async { Ok(json!("colon")) }))
        .unwrap();
    gw.register("create_candidates", handler_fn(|_| async { Ok(json!("legacy")) }))
        .unwrap();

    let resp = gw
        .execute(
            Request::new("contributor", "create_candidates", "/candidates")
                .with_data(json!({"code": "x"})),
        )
        .await;
    assert_eq!(resp.data.unwrap(), json!("legacy"));
}

#[tokio::test]
async fn test_handler_error_status_passes_through() {
    let (mut gw, sink) = builtin_gateway();
    gw.register("read:recipes", Failing).unwrap();

    let resp = gw
        .execute(Request::new("visitor", "read:recipes", "/recipes"))
        .await;
    assert_eq!(resp.status_code(), 503);
    assert_eq!(resp.error_code(), Some("UNAVAILABLE"));

    let rows = sink.query(&AuditQuery::new().result(AuditResult::Failure)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].error_message.as_deref().unwrap().contains("storage offline"));
}

#[tokio::test]
async fn test_crash_isolation() {
    let (mut gw, sink) = builtin_gateway();
    gw.register("read:guard_rules", Panicking).unwrap();
    gw.register("read:recipes", echo()).unwrap();
    let gw = Arc::new(gw);

    let crashed = gw
        .execute(Request::new("visitor", "read:guard_rules", "/guard_rules"))
        .await;
    assert!(!crashed.success);
    assert_eq!(crashed.status_code(), 500);
    assert!(crashed.error.unwrap().message.contains("index out of range"));

    let fine = gw
        .execute(Request::new("visitor", "read:recipes", "/recipes"))
        .await;
    assert!(fine.success);
    assert_eq!(sink.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_plugins_run_in_order_and_amend_result() {
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));
    let (mut gw, _) = builtin_gateway();
    gw.register("read:recipes", handler_fn(|_| async { Ok(json!({})) }))
        .unwrap();
    gw.use_plugin(Tracer { name: "first", log: Arc::clone(&log) });
    gw.use_plugin(Tracer { name: "second", log: Arc::clone(&log) });
    assert_eq!(gw.plugin_names(), vec!["first", "second"]);

    let resp = gw
        .execute(Request::new("visitor", "read:recipes", "/recipes"))
        .await;
    let data = resp.data.unwrap();
    assert_eq!(data["seen_by_first"], true);
    assert_eq!(data["seen_by_second"], true);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["pre:first", "pre:second", "post:first", "post:second"]
    );
}

#[tokio::test]
async fn test_plugins_skipped_when_denied() {
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));
    let (mut gw, _) = builtin_gateway();
    gw.register("delete:recipes", echo()).unwrap();
    gw.use_plugin(Tracer { name: "tracer", log: Arc::clone(&log) });

    gw.execute(Request::new("visitor", "delete:recipes", "/recipes/1"))
        .await;
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_pre_hook_aborts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (mut gw, sink) = builtin_gateway();
    gw.register("read:recipes", Counting(Arc::clone(&calls))).unwrap();
    gw.use_plugin(Blocking);

    let resp = gw
        .execute(Request::new("visitor", "read:recipes", "/recipes"))
        .await;
    assert_eq!(resp.status_code(), 500);
    assert_eq!(resp.error_code(), Some("PLUGIN_ERROR"));
    assert!(resp.error.unwrap().message.contains("maintenance"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let rows = sink.query(&AuditQuery::new()).await.unwrap();
    assert_eq!(rows[0].result, AuditResult::Failure);
}

#[tokio::test]
async fn test_failing_hook_keeps_its_status() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (mut gw, sink) = builtin_gateway();
    gw.register("read:recipes", Counting(Arc::clone(&calls))).unwrap();
    gw.use_plugin(RateLimit);

    let resp = gw
        .execute(Request::new("visitor", "read:recipes", "/recipes"))
        .await;
    assert_eq!(resp.status_code(), 429);
    assert_eq!(resp.error_code(), Some("RATE_LIMITED"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let rows = sink.query(&AuditQuery::new()).await.unwrap();
    assert_eq!(rows[0].result, AuditResult::Failure);
    assert!(rows[0].error_message.as_deref().unwrap().contains("slow down"));
}

#[tokio::test]
async fn test_bounded_sink_reports_evictions() {
    let sink = InMemoryAuditSink::new(3);
    let mut gw = Gateway::new(Arc::new(ConstitutionSource::builtin()), Arc::new(sink.clone()));
    gw.register("read:recipes", echo()).unwrap();

    for _ in 0..5 {
        assert!(gw.execute(Request::new("visitor", "read:recipes", "/recipes")).await.success);
    }
    assert_eq!(sink.count().await.unwrap(), 3);
    assert_eq!(sink.evicted(), 2);
}

#[tokio::test]
async fn test_audit_completeness() {
    let (mut gw, sink) = builtin_gateway();
    gw.register("read:recipes", echo()).unwrap();
    gw.register("delete:recipes", echo()).unwrap();
    gw.register("read:guard_rules", Failing).unwrap();

    let calls = vec![
        (Request::new("visitor", "read:recipes", "/recipes"), true),
        (Request::new("visitor", "delete:recipes", "/recipes/1"), false),
        (Request::new("admin", "delete:recipes", "/recipes/1"), false),
        (
            Request::new("admin", "delete:recipes", "/recipes/1").with_data(json!({"confirmed": true})),
            true,
        ),
        (Request::new("visitor", "read:guard_rules", "/guard_rules"), false),
        (Request::new("nobody", "read:recipes", "/recipes"), false),
        (Request::new("admin", "", "/recipes"), false),
        (Request::new("admin", "read:sessions", "/sessions"), false),
    ];
    let expected: Vec<AuditResult> = calls
        .iter()
        .map(|(_, ok)| if *ok { AuditResult::Success } else { AuditResult::Failure })
        .collect();

    let mut ids = Vec::new();
    for (req, ok) in calls {
        let resp = gw.execute(req).await;
        assert_eq!(resp.success, ok);
        ids.push(resp.request_id);
    }

    assert_eq!(sink.count().await.unwrap(), expected.len());
    let rows = sink.entries().await;
    for (id, result) in ids.iter().zip(expected) {
        let row = rows.iter().find(|r| r.id == *id).unwrap();
        assert_eq!(row.result, result);
    }
}

#[tokio::test]
async fn test_concurrent_calls() {
    let (mut gw, sink) = builtin_gateway();
    gw.register("read:recipes", echo()).unwrap();
    gw.register(
        "create:candidates",
        handler_fn(|_| async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            Ok(json!({"created": true}))
        }),
    )
    .unwrap();
    let gw = Arc::new(gw);

    let a = {
        let gw = Arc::clone(&gw);
        tokio::spawn(async move {
            gw.execute(Request::new("visitor", "read:recipes", "/recipes")).await
        })
    };
    let b = {
        let gw = Arc::clone(&gw);
        tokio::spawn(async move {
            gw.execute(
                Request::new("contributor", "create:candidates", "/candidates")
                    .with_data(json!({"code": "let x = 1;"})),
            )
            .await
        })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert!(a.success && b.success);
    assert_ne!(a.request_id, b.request_id);
    assert_eq!(sink.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_typed_resource_and_own_scope() {
    let (mut gw, _) = builtin_gateway();
    gw.register("read:sessions", echo()).unwrap();

    let own = Request::new("visitor", "read", Resource::typed("sessions", Some("visitor".into())));
    assert!(gw.execute(own).await.success);

    let other = Request::new("visitor", "read", Resource::typed("sessions", Some("admin".into())));
    assert_eq!(gw.execute(other).await.status_code(), 403);
}

#[tokio::test]
async fn test_reload_applies_to_next_call() {
    let source = Arc::new(ConstitutionSource::builtin());
    let mut gw = Gateway::new(Arc::clone(&source), Arc::new(InMemoryAuditSink::new(10)));
    gw.register("read:recipes", echo()).unwrap();

    let req = Request::new("auditor", "read:recipes", "/recipes");
    assert_eq!(gw.execute(req.clone()).await.status_code(), 403);

    let mut doc = Constitution::default();
    doc.version = "builtin-2".into();
    doc.roles.push(Role::new("auditor", "Auditor", &["read:*"]));
    source.replace(doc).unwrap();

    assert!(gw.execute(req).await.success);
}

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let registry = Registry::new();
    let (gw, _) = builtin_gateway();
    let mut gw = gw.with_prometheus(&registry).unwrap();
    gw.register("read:recipes", echo()).unwrap();

    gw.execute(Request::new("visitor", "read:recipes", "/recipes")).await;
    gw.execute(Request::new("visitor", "delete:recipes", "/recipes/1")).await;
    gw.execute(Request::new("visitor", "read:guard_rules", "/guard_rules")).await;

    let metrics = gw.metrics().unwrap();
    assert_eq!(metrics.calls(Outcome::Completed), 1);
    assert_eq!(metrics.calls(Outcome::Denied), 1);
    assert_eq!(metrics.calls(Outcome::NotFound), 1);
}

/// Audit sink that always fails; the call outcome must not change.
struct BrokenSink;

#[async_trait]
impl AuditSink for BrokenSink {
    async fn record(&self, _entry: gatehouse_audit::AuditEntry) -> Result<(), gatehouse_audit::AuditError> {
        Err(gatehouse_audit::AuditError::Unavailable("disk gone".into()))
    }

    async fn query(
        &self,
        _query: &AuditQuery,
    ) -> Result<Vec<gatehouse_audit::AuditEntry>, gatehouse_audit::AuditError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, gatehouse_audit::AuditError> {
        Ok(0)
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn test_audit_failure_is_not_surfaced() {
    let mut gw = Gateway::new(Arc::new(ConstitutionSource::builtin()), Arc::new(BrokenSink));
    gw.register("read:recipes", echo()).unwrap();
    let resp = gw
        .execute(Request::new("visitor", "read:recipes", "/recipes"))
        .await;
    assert!(resp.success);
}
