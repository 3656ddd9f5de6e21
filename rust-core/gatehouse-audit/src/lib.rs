// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Gatehouse audit trail.
//!
//! Every gateway call ends in exactly one [`AuditEntry`]. Entries go to an
//! [`AuditSink`]; two are provided:
//!
//! - [`InMemoryAuditSink`]: bounded ring buffer, shared by cloning.
//! - [`RedbAuditSink`]: durable single-file store, time-ordered keys.

pub mod entry;
pub mod error;
pub mod memory;
pub mod redb_sink;
pub mod sink;

pub use entry::{now_millis, AuditEntry, AuditQuery, AuditResult, AuditStats};
pub use error::AuditError;
pub use memory::InMemoryAuditSink;
pub use redb_sink::RedbAuditSink;
pub use sink::AuditSink;
