// SPDX-License-Identifier: PMPL-1.0-or-later
//! Prometheus instrumentation for the gateway.

use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use serde_json::Value;

use crate::error::GatewayError;

/// How a call ended, as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Denied,
    Violation,
    HandlerError,
    Malformed,
    NotFound,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Completed,
        Outcome::Denied,
        Outcome::Violation,
        Outcome::HandlerError,
        Outcome::Malformed,
        Outcome::NotFound,
    ];

    pub fn of(result: &Result<Value, GatewayError>) -> Self {
        match result {
            Ok(_) => Outcome::Completed,
            Err(GatewayError::PermissionDenied { .. }) => Outcome::Denied,
            Err(GatewayError::ConstitutionViolation(_)) => Outcome::Violation,
            Err(GatewayError::Malformed(_)) => Outcome::Malformed,
            Err(GatewayError::HandlerNotFound(_)) => Outcome::NotFound,
            Err(_) => Outcome::HandlerError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Denied => "denied",
            Outcome::Violation => "violation",
            Outcome::HandlerError => "handler_error",
            Outcome::Malformed => "malformed",
            Outcome::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call counter by outcome and a duration histogram.
#[derive(Debug, Clone)]
pub struct GatewayMetrics {
    calls: IntCounterVec,
    duration: Histogram,
}

impl GatewayMetrics {
    /// Create the metrics and register them with `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let calls = IntCounterVec::new(
            Opts::new("gatehouse_gateway_calls_total", "Gateway calls by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(calls.clone()))?;

        let duration = Histogram::with_opts(HistogramOpts::new(
            "gatehouse_gateway_duration_seconds",
            "Wall-clock duration of gateway calls",
        ))?;
        registry.register(Box::new(duration.clone()))?;

        // Pre-create every label so the series exist at zero.
        for outcome in Outcome::ALL {
            calls.with_label_values(&[outcome.as_str()]);
        }

        Ok(Self { calls, duration })
    }

    pub fn observe(&self, outcome: Outcome, seconds: f64) {
        self.calls.with_label_values(&[outcome.as_str()]).inc();
        self.duration.observe(seconds);
    }

    /// Calls counted under `outcome`.
    pub fn calls(&self, outcome: Outcome) -> u64 {
        self.calls.with_label_values(&[outcome.as_str()]).get()
    }
}
