// SPDX-License-Identifier: PMPL-1.0-or-later
//! Response envelope returned by every `execute` call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::GatewayError;

/// Error part of the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Structured detail, e.g. the violation list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&GatewayError> for ErrorBody {
    fn from(err: &GatewayError) -> Self {
        let details = match err {
            GatewayError::ConstitutionViolation(v) => serde_json::to_value(&v.violations).ok(),
            GatewayError::PermissionDenied {
                required: Some(required),
                ..
            } => Some(serde_json::json!({ "required": required })),
            _ => None,
        };
        Self {
            message: err.to_string(),
            status_code: err.status_code(),
            code: Some(err.code().to_string()),
            details,
        }
    }
}

/// Uniform result of a gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub request_id: Uuid,
    pub duration_ms: u64,
}

impl GatewayResponse {
    pub fn from_result(
        request_id: Uuid,
        duration_ms: u64,
        result: &Result<Value, GatewayError>,
    ) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data.clone()),
                error: None,
                request_id,
                duration_ms,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody::from(err)),
                request_id,
                duration_ms,
            },
        }
    }

    /// 200 on success, else the error's status.
    pub fn status_code(&self) -> u16 {
        self.error.as_ref().map_or(200, |e| e.status_code)
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let id = Uuid::new_v4();
        let resp = GatewayResponse::from_result(id, 3, &Ok(json!({"id": 1})));
        assert!(resp.success);
        assert_eq!(resp.status_code(), 200);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_denied_envelope_carries_required() {
        let err = GatewayError::PermissionDenied {
            reason: "role 'visitor' lacks permission 'delete:recipes'".into(),
            required: Some("delete:recipes".into()),
        };
        let resp = GatewayResponse::from_result(Uuid::new_v4(), 1, &Err(err));
        assert!(!resp.success);
        assert_eq!(resp.status_code(), 403);
        assert_eq!(resp.error_code(), Some("PERMISSION_DENIED"));
        let body = resp.error.unwrap();
        assert_eq!(body.details.unwrap()["required"], "delete:recipes");
    }
}
