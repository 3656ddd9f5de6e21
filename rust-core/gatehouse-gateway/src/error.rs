// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gateway error types.
//
// Every way a call can end short of success, with the HTTP-style status and
// machine-readable code the response envelope carries.

use gatehouse_rules::ConstitutionViolation;
use thiserror::Error;

/// Failure reported by a handler or plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    /// Status to report; 500 when absent.
    pub status: Option<u16>,
    /// Code to report; `HANDLER_ERROR` when absent.
    pub code: Option<String>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Bad input to a handler (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message).with_status(400)
    }
}

/// Errors produced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request is missing an actor or an action.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The permission engine denied the call.
    #[error("permission denied: {reason}")]
    PermissionDenied {
        reason: String,
        required: Option<String>,
    },

    /// One or more governance rules failed.
    #[error(transparent)]
    ConstitutionViolation(#[from] ConstitutionViolation),

    /// No handler is registered for the action.
    #[error("no handler registered for action '{0}'")]
    HandlerNotFound(String),

    /// The handler failed or panicked.
    #[error("handler failed: {0}")]
    Handler(HandlerError),

    /// A plugin hook failed or panicked.
    #[error("plugin '{plugin}' failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: HandlerError,
    },

    /// Registration of an action that already has a handler.
    #[error("handler already registered for action '{0}'")]
    DuplicateHandler(String),
}

impl GatewayError {
    /// HTTP-style status for the response envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Malformed(_) => 400,
            GatewayError::PermissionDenied { .. } => 403,
            GatewayError::ConstitutionViolation(_) => 400,
            GatewayError::HandlerNotFound(_) => 404,
            GatewayError::Handler(e) => e.status.unwrap_or(500),
            GatewayError::Plugin { source, .. } => source.status.unwrap_or(500),
            GatewayError::DuplicateHandler(_) => 500,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            GatewayError::Malformed(_) => "MALFORMED_REQUEST",
            GatewayError::PermissionDenied { .. } => "PERMISSION_DENIED",
            GatewayError::ConstitutionViolation(_) => "CONSTITUTION_VIOLATION",
            GatewayError::HandlerNotFound(_) => "HANDLER_NOT_FOUND",
            GatewayError::Handler(e) => e.code.as_deref().unwrap_or("HANDLER_ERROR"),
            GatewayError::Plugin { source, .. } => {
                source.code.as_deref().unwrap_or("PLUGIN_ERROR")
            }
            GatewayError::DuplicateHandler(_) => "DUPLICATE_HANDLER",
        }
    }
}
