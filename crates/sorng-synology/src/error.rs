//! Error types for the Synology File Station client.
//!
//! All public API surfaces in this crate return `SynologyResult<T>`. DSM
//! reports failures as numeric codes inside the response envelope; the
//! lookup tables at the bottom of this module turn them into readable text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias.
pub type SynologyResult<T> = Result<T, SynologyError>;

/// DSM codes meaning the `_sid` is no longer accepted: session timeout (106),
/// interrupted by a duplicate login (107), invalid session (119).
pub const SESSION_ERROR_CODES: [i64; 3] = [106, 107, 119];

/// Whether a DSM error code means the session must be re-established.
pub fn is_session_error(code: i64) -> bool {
    SESSION_ERROR_CODES.contains(&code)
}

/// Failure categories surfaced by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynologyErrorKind {
    /// The TOTP shared secret is empty or not valid base-32.
    InvalidSecret,
    /// Login rejected (bad credentials, bad OTP, blocked IP) or the session
    /// was rejected again right after a refresh.
    AuthenticationFailed,
    /// Network, DNS, TLS or timeout failure, or a non-2xx HTTP status.
    Transport,
    /// The response was not a well-formed DSM envelope.
    Protocol,
    /// A well-formed failure envelope from a File Station call.
    Service,
    /// The connection configuration failed validation.
    InvalidConfig,
    /// An upload request failed validation before dispatch.
    InvalidRequest,
    /// The batch was cancelled by the caller.
    Cancelled,
}

impl SynologyErrorKind {
    /// Stable label used when no numeric DSM code is available.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSecret => "InvalidSecret",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::Transport => "TransportError",
            Self::Protocol => "ProtocolError",
            Self::Service => "ServiceError",
            Self::InvalidConfig => "InvalidConfig",
            Self::InvalidRequest => "InvalidRequest",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for SynologyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by every public function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynologyError {
    pub kind: SynologyErrorKind,
    pub message: String,
    /// DSM error code, when the failure came from a response envelope.
    pub code: Option<i64>,
}

impl fmt::Display for SynologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(code) = self.code {
            write!(f, " (code {})", code)?;
        }
        Ok(())
    }
}

impl std::error::Error for SynologyError {}

impl SynologyError {
    pub fn new(kind: SynologyErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
        }
    }

    /// Attach a DSM error code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn invalid_secret(msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::InvalidSecret, msg)
    }

    pub fn auth_failed(code: i64, msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::AuthenticationFailed, msg).with_code(code)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::Transport, msg)
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::Protocol, msg)
    }

    pub fn service(code: i64, msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::Service, msg).with_code(code)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::InvalidConfig, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::InvalidRequest, msg)
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(SynologyErrorKind::Cancelled, msg)
    }

    /// Inspectable code for batch output: the DSM code when there is one,
    /// otherwise the kind label.
    pub fn code_label(&self) -> String {
        match self.code {
            Some(code) => code.to_string(),
            None => self.kind.as_str().to_string(),
        }
    }

    /// True when DSM rejected the session itself.
    pub fn is_session_expired(&self) -> bool {
        self.code.map_or(false, is_session_error)
    }
}

impl From<reqwest::Error> for SynologyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            Self::transport(format!("Connection failed: {}", err))
        } else {
            Self::transport(format!("HTTP error: {}", err))
        }
    }
}

impl From<serde_json::Error> for SynologyError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(format!("JSON error: {}", err))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  DSM error-code tables
// ═══════════════════════════════════════════════════════════════════════

/// Which API family produced a code. DSM reuses the 400 range with
/// different meanings for `SYNO.API.Auth` and `SYNO.FileStation.*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiScope {
    Auth,
    FileStation,
}

/// Human-readable description of a DSM error code.
pub fn describe_error_code(scope: ApiScope, code: i64) -> String {
    let scoped = match scope {
        ApiScope::Auth => auth_error_text(code),
        ApiScope::FileStation => file_station_error_text(code),
    };
    scoped
        .or_else(|| common_error_text(code))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown error {}", code))
}

fn common_error_text(code: i64) -> Option<&'static str> {
    let text = match code {
        100 => "Unknown error",
        101 => "No parameter of API, method or version",
        102 => "The requested API does not exist",
        103 => "The requested method does not exist",
        104 => "The requested version does not support the functionality",
        105 => "The logged in session does not have permission",
        106 => "Session timeout",
        107 => "Session interrupted by duplicate login",
        108 => "Failed to upload the file",
        109 | 110 | 111 | 117 | 118 => {
            "The network connection is unstable or the system is busy"
        }
        112 | 113 => "Preserve for other purpose",
        114 => "Lost parameters for this API",
        115 => "Not allowed to upload a file",
        116 => "Not allowed to perform for a demo site",
        119 => "Invalid session",
        150 => "Request source IP does not match the login IP",
        160 => "Insufficient application privilege",
        _ => return None,
    };
    Some(text)
}

fn auth_error_text(code: i64) -> Option<&'static str> {
    let text = match code {
        400 => "No such account or incorrect password",
        401 => "Disabled account",
        402 => "Denied permission",
        403 => "2-factor authentication code required",
        404 => "Failed to authenticate 2-factor authentication code",
        406 => "Enforce to authenticate with 2-factor authentication code",
        407 => "Blocked IP source",
        408 => "Expired password cannot change",
        409 => "Expired password",
        410 => "Password must be changed",
        _ => return None,
    };
    Some(text)
}

fn file_station_error_text(code: i64) -> Option<&'static str> {
    let text = match code {
        400 => "Invalid parameter of file operation",
        401 => "Unknown error of file operation",
        402 => "System is too busy",
        403 => "Invalid user does this file operation",
        404 => "Invalid group does this file operation",
        405 => "Invalid user and group does this file operation",
        406 => "Can't get user/group information from the account server",
        407 => "Operation not permitted",
        408 => "No such file or directory",
        409 => "Non-supported file system",
        410 => "Failed to connect internet-based file system",
        411 => "Read-only file system",
        412 => "Filename too long in the non-encrypted file system",
        413 => "Filename too long in the encrypted file system",
        414 => "File already exists",
        415 => "Disk quota exceeded",
        416 => "No space left on device",
        417 => "Input/output error",
        418 => "Illegal name or path",
        419 => "Illegal file name",
        420 => "Illegal file name on FAT file system",
        421 => "Device or resource busy",
        599 => "No such task of the file operation",
        1800 => "Content-Length missing or the received size does not match",
        1801 => "Timed out waiting for upload data from the client",
        1802 => "No filename information in the last part of file content",
        1803 => "Upload connection is cancelled",
        1804 => "Failed to upload oversized file to FAT file system",
        1805 => "Can't overwrite or skip the existing file without an overwrite parameter",
        _ => return None,
    };
    Some(text)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
