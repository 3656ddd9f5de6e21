// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Audit rows, queries, and aggregates.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outcome recorded for a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    Success,
    Failure,
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditResult::Success => write!(f, "success"),
            AuditResult::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(AuditResult::Success),
            "failure" => Ok(AuditResult::Failure),
            other => Err(format!("unknown audit result '{}'", other)),
        }
    }
}

/// One audit row. Written once per gateway call, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
    pub actor: String,
    /// Role name, constitution version, session.
    #[serde(default)]
    pub actor_context: Value,
    pub action: String,
    pub resource: String,
    /// Request payload as received.
    #[serde(default, rename = "operation_data")]
    pub payload_snapshot: Value,
    pub result: AuditResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

impl AuditEntry {
    /// New entry stamped with a fresh id and the current time.
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
        result: AuditResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: now_millis(),
            actor: actor.into(),
            actor_context: Value::Null,
            action: action.into(),
            resource: resource.into(),
            payload_snapshot: Value::Null,
            result,
            error_message: None,
            duration_ms: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_actor_context(mut self, context: Value) -> Self {
        self.actor_context = context;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload_snapshot = payload;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        self.result == AuditResult::Success
    }
}

/// Filter over audit rows. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub result: Option<AuditResult>,
    /// Inclusive lower bound, epoch ms.
    #[serde(default)]
    pub since: Option<u64>,
    /// Inclusive upper bound, epoch ms.
    #[serde(default)]
    pub until: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn result(mut self, result: AuditResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: u64) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `entry` passes every set filter. `limit` is not considered.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.actor.as_deref().map_or(true, |a| a == entry.actor)
            && self.action.as_deref().map_or(true, |a| a == entry.action)
            && self.result.map_or(true, |r| r == entry.result)
            && self.since.map_or(true, |s| entry.timestamp >= s)
            && self.until.map_or(true, |u| entry.timestamp <= u)
    }

    /// Maximum rows to return.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(usize::MAX)
    }
}

/// Aggregate over a window of audit rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStats {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub by_actor: BTreeMap<String, u64>,
    pub by_action: BTreeMap<String, u64>,
    /// Mean over rows that carry a duration.
    pub avg_duration_ms: Option<f64>,
}

impl AuditStats {
    /// Fold rows into an aggregate.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AuditEntry>) -> Self {
        let mut stats = AuditStats::default();
        let mut duration_sum = 0u64;
        let mut duration_count = 0u64;

        for entry in entries {
            stats.total += 1;
            match entry.result {
                AuditResult::Success => stats.success += 1,
                AuditResult::Failure => stats.failure += 1,
            }
            *stats.by_actor.entry(entry.actor.clone()).or_insert(0) += 1;
            *stats.by_action.entry(entry.action.clone()).or_insert(0) += 1;
            if let Some(ms) = entry.duration_ms {
                duration_sum = duration_sum.saturating_add(ms);
                duration_count += 1;
            }
        }

        if duration_count > 0 {
            stats.avg_duration_ms = Some(duration_sum as f64 / duration_count as f64);
        }
        stats
    }
}
