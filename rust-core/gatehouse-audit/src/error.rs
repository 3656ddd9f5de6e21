// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit error types.
//
// Audit failures are reported to the caller of a sink but the gateway only
// logs them; a broken audit store never changes a request's outcome.

use thiserror::Error;

/// Errors that can occur when writing to or reading from an audit sink.
#[derive(Debug, Error)]
pub enum AuditError {
    /// An I/O error occurred while opening the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying store rejected the operation.
    #[error("audit store error: {0}")]
    Store(String),

    /// The store is not reachable.
    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}
