// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory audit sink.
//
// Unbounded by default, so every recorded row is kept. With a capacity it
// becomes a ring buffer: once `capacity` rows are held the oldest row is
// dropped for each new one, logged at `warn!` and counted in `evicted()`.
// Durable, append-only retention is the redb sink's job.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::entry::{AuditEntry, AuditQuery};
use crate::error::AuditError;
use crate::sink::AuditSink;

/// Audit sink backed by a shared in-memory buffer.
///
/// Cloning yields another handle to the same buffer.
#[derive(Debug, Clone)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
    capacity: Option<usize>,
    evicted: Arc<AtomicU64>,
}

impl InMemoryAuditSink {
    /// Create a sink retaining at most `capacity` rows (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity: Some(capacity),
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a sink that never drops rows.
    pub fn unbounded() -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            capacity: None,
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Row limit, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Rows dropped to make room since the sink was created.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Snapshot of every retained row, oldest first.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.write().await;
        if let Some(capacity) = self.capacity {
            while entries.len() >= capacity {
                let Some(dropped) = entries.pop_front() else {
                    break;
                };
                let total = self.evicted.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    evicted_id = %dropped.id,
                    evicted_timestamp = dropped.timestamp,
                    capacity,
                    total_evicted = total,
                    "audit buffer full, oldest row dropped"
                );
            }
        }
        entries.push_back(entry);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, AuditError> {
        let entries = self.entries.read().await;
        let mut rows: Vec<AuditEntry> = entries
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        // Insertion order can disagree with timestamps under concurrency.
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(query.effective_limit());
        Ok(rows)
    }

    async fn count(&self) -> Result<usize, AuditError> {
        Ok(self.entries.read().await.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditResult;

    fn row(actor: &str, ts: u64) -> AuditEntry {
        AuditEntry::new(actor, "read:recipes", "/recipes", AuditResult::Success).with_timestamp(ts)
    }

    #[tokio::test]
    async fn test_record_and_query() {
        let sink = InMemoryAuditSink::new(10);
        sink.record(row("admin", 1)).await.unwrap();
        sink.record(row("visitor", 2)).await.unwrap();

        let all = sink.query(&AuditQuery::new()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].actor, "visitor");

        let admin = sink.query(&AuditQuery::new().actor("admin")).await.unwrap();
        assert_eq!(admin.len(), 1);
    }

    #[tokio::test]
    async fn test_ring_buffer_eviction() {
        let sink = InMemoryAuditSink::new(3);
        for ts in 0..5 {
            sink.record(row("admin", ts)).await.unwrap();
        }
        assert_eq!(sink.count().await.unwrap(), 3);
        let oldest = sink.entries().await[0].timestamp;
        assert_eq!(oldest, 2);
        assert_eq!(sink.evicted(), 2);
    }

    #[tokio::test]
    async fn test_unbounded_keeps_every_row() {
        let sink = InMemoryAuditSink::default();
        assert_eq!(sink.capacity(), None);
        for ts in 0..20_500 {
            sink.record(row("admin", ts)).await.unwrap();
        }
        assert_eq!(sink.count().await.unwrap(), 20_500);
        assert_eq!(sink.evicted(), 0);
    }

    #[tokio::test]
    async fn test_limit_applies_after_filter() {
        let sink = InMemoryAuditSink::default();
        for ts in 0..10 {
            sink.record(row(if ts % 2 == 0 { "a" } else { "b" }, ts)).await.unwrap();
        }
        let rows = sink.query(&AuditQuery::new().actor("a").limit(2)).await.unwrap();
        let stamps: Vec<u64> = rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![8, 6]);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let sink = InMemoryAuditSink::new(5);
        let other = sink.clone();
        sink.record(row("admin", 1)).await.unwrap();
        assert_eq!(other.len().await, 1);
        assert!(!other.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_one() {
        let sink = InMemoryAuditSink::new(0);
        sink.record(row("admin", 1)).await.unwrap();
        sink.record(row("admin", 2)).await.unwrap();
        assert_eq!(sink.capacity(), Some(1));
        assert_eq!(sink.evicted(), 1);
        assert_eq!(sink.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_default_stats() {
        let sink = InMemoryAuditSink::new(10);
        sink.record(row("admin", 5).with_duration(10)).await.unwrap();
        sink.record(row("admin", 50)).await.unwrap();
        let stats = sink.stats(Some(10)).await.unwrap();
        assert_eq!(stats.total, 1);
        let stats = sink.stats(None).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.avg_duration_ms, Some(10.0));
    }
}
