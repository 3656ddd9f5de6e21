// SPDX-License-Identifier: PMPL-1.0-or-later
//! Gatehouse API
//!
//! HTTP front-end for the gateway. Callers identify themselves with the
//! `x-gatehouse-actor` header (or the `actor` field of an `/execute` body);
//! every operation, including audit reads and constitution reloads, goes
//! through [`Gateway::execute`].

pub mod actions;
pub mod config;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use gatehouse_audit::{AuditError, AuditQuery, AuditSink, InMemoryAuditSink, RedbAuditSink};
use gatehouse_constitution::{ConstitutionError, ConstitutionSource};
use gatehouse_core::Request;
use gatehouse_gateway::{Gateway, GatewayError, GatewayResponse};
use prometheus::{Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

pub use actions::{ReadAuditLogs, ReloadConstitution, READ_AUDIT_LOGS, RELOAD_CONSTITUTION};
pub use config::ServerConfig;

/// Header naming the calling actor.
pub const ACTOR_HEADER: &str = "x-gatehouse-actor";
/// Header carrying an optional session id.
pub const SESSION_HEADER: &str = "x-gatehouse-session";

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Constitution(#[from] ConstitutionError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<prometheus::Error> for ApiError {
    fn from(err: prometheus::Error) -> Self {
        ApiError::Internal(format!("metrics: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Constitution summary
#[derive(Debug, Serialize, Deserialize)]
pub struct ConstitutionResponse {
    pub version: String,
    pub generation: u64,
    pub roles: Vec<String>,
    pub priorities: Vec<String>,
}

/// Query parameters for `/audit/stats`
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub since: Option<u64>,
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub registry: Registry,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(gateway: Gateway, registry: Registry) -> Self {
        Self {
            gateway: Arc::new(gateway),
            registry,
            start_time: std::time::Instant::now(),
        }
    }

    /// Build the constitution source, audit sink, and gateway described by
    /// `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        let source = match &config.constitution_path {
            Some(path) => ConstitutionSource::from_path(path)?,
            None => ConstitutionSource::builtin(),
        };
        let sink: Arc<dyn AuditSink> = match &config.audit_path {
            Some(path) => Arc::new(RedbAuditSink::open(path)?),
            None => match config.audit_capacity {
                Some(capacity) => {
                    warn!(
                        capacity,
                        "in-memory audit sink is bounded; set GATEHOUSE_AUDIT_PATH for durable retention"
                    );
                    Arc::new(InMemoryAuditSink::new(capacity))
                }
                None => Arc::new(InMemoryAuditSink::unbounded()),
            },
        };
        let registry = Registry::new();
        let gateway = build_gateway(Arc::new(source), sink, &registry)?;
        Ok(Self::new(gateway, registry))
    }
}

/// Gateway with metrics and the built-in administrative actions registered.
pub fn build_gateway(
    source: Arc<ConstitutionSource>,
    sink: Arc<dyn AuditSink>,
    registry: &Registry,
) -> Result<Gateway, ApiError> {
    let mut gateway =
        Gateway::new(Arc::clone(&source), Arc::clone(&sink)).with_prometheus(registry)?;
    gateway.register(RELOAD_CONSTITUTION, ReloadConstitution::new(source))?;
    gateway.register(READ_AUDIT_LOGS, ReadAuditLogs::new(sink))?;
    Ok(gateway)
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        // Gateway
        .route("/execute", post(execute_handler))
        // Audit trail
        .route("/audit", get(audit_handler))
        .route("/audit/stats", get(audit_stats_handler))
        // Constitution
        .route("/constitution", get(constitution_handler))
        .route("/constitution/reload", post(reload_handler))
        // Metrics
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Request record for an administrative call made on behalf of the header
/// actor.
fn header_request(headers: &HeaderMap, action: &str, resource: &str, data: Value) -> Request {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let mut request =
        Request::new(header_value(ACTOR_HEADER).unwrap_or_default(), action, resource)
            .with_data(data);
    request.session = header_value(SESSION_HEADER);
    request
}

fn envelope(response: GatewayResponse) -> (StatusCode, Json<GatewayResponse>) {
    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

/// Health check handler
#[instrument(skip(state))]
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check handler
#[instrument]
async fn ready_handler() -> StatusCode {
    StatusCode::OK
}

/// Run a request record through the gateway
#[instrument(skip(state, body))]
async fn execute_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<GatewayResponse>), ApiError> {
    let request: Request = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request record: {}", e)))?;
    Ok(envelope(state.gateway.execute(request).await))
}

/// Audit query handler
#[instrument(skip(state, headers))]
async fn audit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Result<(StatusCode, Json<GatewayResponse>), ApiError> {
    let data = serde_json::to_value(&query)
        .map_err(|e| ApiError::Internal(format!("encode audit query: {}", e)))?;
    let request = header_request(&headers, READ_AUDIT_LOGS, "/audit_logs", data);
    Ok(envelope(state.gateway.execute(request).await))
}

/// Audit aggregate handler
#[instrument(skip(state, headers))]
async fn audit_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<StatsParams>,
) -> (StatusCode, Json<GatewayResponse>) {
    let data = json!({ "view": "stats", "since": params.since });
    let request = header_request(&headers, READ_AUDIT_LOGS, "/audit_logs", data);
    envelope(state.gateway.execute(request).await)
}

/// Constitution summary handler
#[instrument(skip(state))]
async fn constitution_handler(State(state): State<AppState>) -> Json<ConstitutionResponse> {
    let source = state.gateway.source();
    let snapshot = source.snapshot();
    Json(ConstitutionResponse {
        version: snapshot.version.clone(),
        generation: source.generation(),
        roles: snapshot.role_ids().into_iter().map(str::to_string).collect(),
        priorities: source.priorities().into_iter().map(|p| p.name).collect(),
    })
}

/// Constitution reload handler
#[instrument(skip(state, headers))]
async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<GatewayResponse>) {
    let request = header_request(&headers, RELOAD_CONSTITUTION, "/constitution", Value::Null);
    envelope(state.gateway.execute(request).await)
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = TextEncoder::new()
        .encode_to_string(&state.registry.gather())
        .map_err(|e| ApiError::Internal(format!("metrics encode: {}", e)))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Start the API server
pub async fn serve(config: ServerConfig) -> Result<(), ApiError> {
    let state = AppState::from_config(&config)?;
    info!(
        actions = ?state.gateway.registered_actions(),
        audit = %state.gateway.audit().name(),
        version = %state.gateway.source().version(),
        "gateway ready"
    );
    let app = build_router(state);

    let addr = config.bind_addr();
    info!("Starting Gatehouse API server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Internal(format!("bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("server: {}", e)))?;

    Ok(())
}
