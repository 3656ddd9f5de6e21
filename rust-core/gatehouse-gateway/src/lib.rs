// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Gatehouse gateway.
//!
//! Every operation against the knowledge base goes through
//! [`Gateway::execute`], which checks the caller's permission, validates the
//! request against the constitution rules, dispatches to the registered
//! handler with plugin hooks around it, and records the outcome to the audit
//! sink. The caller always gets a [`GatewayResponse`]; failures are values.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatehouse_audit::InMemoryAuditSink;
//! use gatehouse_constitution::ConstitutionSource;
//! use gatehouse_core::Request;
//! use gatehouse_gateway::{handler_fn, Gateway};
//!
//! # async fn demo() {
//! let mut gateway = Gateway::new(
//!     Arc::new(ConstitutionSource::builtin()),
//!     Arc::new(InMemoryAuditSink::default()),
//! );
//! gateway
//!     .register("read:recipes", handler_fn(|_ctx| async { Ok(serde_json::json!([])) }))
//!     .unwrap();
//!
//! let response = gateway
//!     .execute(Request::new("visitor", "read:recipes", "/recipes"))
//!     .await;
//! assert!(response.success);
//! # }
//! ```

pub mod context;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod metrics;
pub mod response;

pub use context::RequestContext;
pub use error::{GatewayError, HandlerError};
pub use gateway::Gateway;
pub use handler::{handler_fn, FnHandler, Handler, Plugin};
pub use metrics::{GatewayMetrics, Outcome};
pub use response::{ErrorBody, GatewayResponse};
