// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit sink trait.
//
// A sink is an append-only store of `AuditEntry` rows with a small query
// surface. Sinks are shared across tokio tasks, so implementations must be
// `Send + Sync` and handle their own write serialization.

use async_trait::async_trait;

use crate::entry::{AuditEntry, AuditQuery, AuditStats};
use crate::error::AuditError;

/// Append-only audit store.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one row. Rows are never updated or removed by the gateway.
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;

    /// Rows matching `query`, most recent first, up to `query.limit`.
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, AuditError>;

    /// Aggregate over rows at or after `since` (all rows when `None`).
    async fn stats(&self, since: Option<u64>) -> Result<AuditStats, AuditError> {
        let query = AuditQuery {
            since,
            ..AuditQuery::default()
        };
        let rows = self.query(&query).await?;
        Ok(AuditStats::from_entries(&rows))
    }

    /// Number of retained rows.
    async fn count(&self) -> Result<usize, AuditError>;

    /// Human-readable sink name, for logs and diagnostics.
    fn name(&self) -> &str;
}
