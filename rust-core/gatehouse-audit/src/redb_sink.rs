// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// redb-backed durable audit sink.
//
// # Design
//
// - Single redb `Database` file with one table, `audit_log`.
// - Keys are the big-endian timestamp (8 bytes) followed by the entry's
//   UUID (16 bytes), so lexicographic key order is time order and a
//   time-window query is a range scan.
// - Values are the JSON-encoded `AuditEntry`.
// - Every record is its own write transaction; redb serializes writers and
//   fsyncs on commit.
// - Blocking redb calls run on `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
};
use tracing::debug;

use crate::entry::{AuditEntry, AuditQuery};
use crate::error::AuditError;
use crate::sink::AuditSink;

const AUDIT_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("audit_log");

const KEY_LEN: usize = 8 + 16;

/// Key for an entry: timestamp then id.
fn entry_key(entry: &AuditEntry) -> Vec<u8> {
    let mut key = Vec::with_capacity(KEY_LEN);
    key.extend_from_slice(&entry.timestamp.to_be_bytes());
    key.extend_from_slice(entry.id.as_bytes());
    key
}

/// Inclusive lower and exclusive upper scan keys for a time window.
fn window_bounds(since: Option<u64>, until: Option<u64>) -> (Vec<u8>, Vec<u8>) {
    let mut lower = since.unwrap_or(0).to_be_bytes().to_vec();
    lower.resize(KEY_LEN, 0);

    let upper = match until.and_then(|u| u.checked_add(1)) {
        Some(next) => {
            let mut upper = next.to_be_bytes().to_vec();
            upper.resize(KEY_LEN, 0);
            upper
        }
        // Sorts after every real key.
        None => vec![0xFF; KEY_LEN + 1],
    };
    (lower, upper)
}

/// Durable audit sink in a single redb file.
pub struct RedbAuditSink {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbAuditSink {
    /// Open or create the audit database at `path`, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(&path).map_err(|e| {
            AuditError::Unavailable(format!("failed to open redb at {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "opened redb audit sink");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RedbAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbAuditSink")
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl AuditSink for RedbAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let db = Arc::clone(&self.db);
        let key = entry_key(&entry);
        let value = serde_json::to_vec(&entry)?;

        tokio::task::spawn_blocking(move || -> Result<(), AuditError> {
            let txn = db
                .begin_write()
                .map_err(|e| AuditError::Unavailable(format!("write txn: {e}")))?;
            {
                let mut table = txn
                    .open_table(AUDIT_TABLE)
                    .map_err(|e| AuditError::Store(format!("open table: {e}")))?;
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(|e| AuditError::Store(format!("insert: {e}")))?;
            }
            txn.commit()
                .map_err(|e| AuditError::Store(format!("commit: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| AuditError::Unavailable(format!("task join: {e}")))?
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, AuditError> {
        let db = Arc::clone(&self.db);
        let query = query.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<AuditEntry>, AuditError> {
            let txn = db
                .begin_read()
                .map_err(|e| AuditError::Unavailable(format!("read txn: {e}")))?;
            let table = match txn.open_table(AUDIT_TABLE) {
                Ok(t) => t,
                // Nothing recorded yet.
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(AuditError::Store(format!("open table: {e}"))),
            };

            let (lower, upper) = window_bounds(query.since, query.until);
            let limit = query.effective_limit();
            let mut rows = Vec::new();

            let iter = table
                .range(lower.as_slice()..upper.as_slice())
                .map_err(|e| AuditError::Store(format!("range scan: {e}")))?;

            for item in iter.rev() {
                let (_, value) =
                    item.map_err(|e| AuditError::Store(format!("scan entry: {e}")))?;
                let entry: AuditEntry = serde_json::from_slice(value.value())?;
                if !query.matches(&entry) {
                    continue;
                }
                rows.push(entry);
                if rows.len() >= limit {
                    break;
                }
            }
            Ok(rows)
        })
        .await
        .map_err(|e| AuditError::Unavailable(format!("task join: {e}")))?
    }

    async fn count(&self) -> Result<usize, AuditError> {
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<usize, AuditError> {
            let txn = db
                .begin_read()
                .map_err(|e| AuditError::Unavailable(format!("read txn: {e}")))?;
            let table = match txn.open_table(AUDIT_TABLE) {
                Ok(t) => t,
                Err(TableError::TableDoesNotExist(_)) => return Ok(0),
                Err(e) => return Err(AuditError::Store(format!("open table: {e}"))),
            };
            let len = table
                .len()
                .map_err(|e| AuditError::Store(format!("len: {e}")))?;
            Ok(usize::try_from(len).unwrap_or(usize::MAX))
        })
        .await
        .map_err(|e| AuditError::Unavailable(format!("task join: {e}")))?
    }

    fn name(&self) -> &str {
        "redb"
    }
}
