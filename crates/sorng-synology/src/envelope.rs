//! DSM response envelope: `{"success": bool, "data": {...}}` or
//! `{"success": false, "error": {"code": N}}`.

use crate::error::{describe_error_code, ApiScope, SynologyError, SynologyResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire-level response wrapper shared by every SYNO.* API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

/// `error` member of a failed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    /// Per-path details some File Station calls attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl ApiEnvelope {
    /// Decode a response body. Anything that is not an envelope is a
    /// protocol error.
    pub fn parse(body: &str) -> SynologyResult<Self> {
        serde_json::from_str(body).map_err(|e| {
            SynologyError::protocol(format!("Response is not a DSM envelope: {}", e))
        })
    }

    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: i64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiErrorBody {
                code: Some(code),
                errors: None,
            }),
        }
    }
}

/// Decoded outcome of one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    Success { data: Value },
    Failure { error_code: i64, message: String },
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error_code, .. } => Some(*error_code),
        }
    }

    /// Turn a failure into a `Service` error.
    pub fn into_result(self) -> SynologyResult<Value> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Failure {
                error_code,
                message,
            } => Err(SynologyError::service(error_code, message)),
        }
    }
}

/// Map an envelope to an [`OperationResult`]. Only malformed envelopes
/// produce an `Err`.
pub fn interpret(envelope: ApiEnvelope, scope: ApiScope) -> SynologyResult<OperationResult> {
    match envelope {
        ApiEnvelope {
            success: true,
            data: Some(data),
            ..
        } => Ok(OperationResult::Success { data }),
        ApiEnvelope { success: true, .. } => Err(SynologyError::protocol(
            "Envelope reports success but carries no data",
        )),
        ApiEnvelope {
            success: false,
            error: Some(ApiErrorBody {
                code: Some(code), ..
            }),
            ..
        } => Ok(OperationResult::Failure {
            error_code: code,
            message: describe_error_code(scope, code),
        }),
        ApiEnvelope { success: false, .. } => Err(SynologyError::protocol(
            "Envelope reports failure but carries no error code",
        )),
    }
}
