//! Shared types for the Synology File Station client.
//!
//! Covers the connection configuration (credential + transport settings),
//! the upload request model, batch policy and the File Station info payload.

use crate::error::{SynologyError, SynologyResult};
use crate::totp::TotpGenerator;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  API constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Single CGI entry point shared by every SYNO.* API.
pub const ENTRY_PATH: &str = "webapi/entry.cgi";

pub const AUTH_API: &str = "SYNO.API.Auth";
pub const AUTH_VERSION: u32 = 6;
pub const UPLOAD_API: &str = "SYNO.FileStation.Upload";
pub const UPLOAD_VERSION: u32 = 2;
pub const INFO_API: &str = "SYNO.FileStation.Info";
pub const INFO_VERSION: u32 = 2;

/// Query parameter carrying the session token on authenticated calls.
pub const SID_PARAM: &str = "_sid";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Connection configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Credential and connection settings for one DSM account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynologyConfig {
    /// Base URL of the DSM instance (e.g. `https://nas.example.synology.me:5001`).
    pub url: String,
    pub username: String,
    pub password: String,
    /// Send a TOTP code with every login.
    #[serde(default, rename = "need2fa")]
    pub need_2fa: bool,
    /// Base-32 TOTP shared secret; required when `need_2fa` is set.
    #[serde(default)]
    pub totp_secret: Option<String>,
    /// Value of the `session` login parameter.
    #[serde(default = "default_session_name")]
    pub session_name: String,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Accept self-signed certificates (common on DSM boxes).
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Retire a cached session once it is this old. `None` keeps it until
    /// DSM rejects it.
    #[serde(default)]
    pub session_max_age_secs: Option<u64>,
}

fn default_session_name() -> String {
    "SortOfRemoteNG".to_string()
}
fn default_timeout() -> u64 {
    30
}

impl Default for SynologyConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            need_2fa: false,
            totp_secret: None,
            session_name: default_session_name(),
            timeout_seconds: default_timeout(),
            accept_invalid_certs: false,
            session_max_age_secs: None,
        }
    }
}

impl fmt::Debug for SynologyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynologyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("need_2fa", &self.need_2fa)
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "***"))
            .field("session_name", &self.session_name)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("session_max_age_secs", &self.session_max_age_secs)
            .finish()
    }
}

impl SynologyConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Builder: require a TOTP code on login.
    pub fn with_totp_secret(mut self, secret: impl Into<String>) -> Self {
        self.need_2fa = true;
        self.totp_secret = Some(secret.into());
        self
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Full URL of `webapi/entry.cgi`.
    pub fn entry_url(&self) -> String {
        format!("{}/{}", self.base_url(), ENTRY_PATH)
    }

    /// Base URL with scheme and host lowercased; the path keeps its case.
    pub fn normalized_base_url(&self) -> String {
        match url::Url::parse(self.base_url()) {
            Ok(parsed) => parsed.as_str().trim_end_matches('/').to_string(),
            Err(_) => self.base_url().to_string(),
        }
    }

    /// Session cache key: a SHA-1 digest over every credential field, so two
    /// configs share a session only when they would log in identically.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha1::new();
        let totp_secret = if self.need_2fa {
            self.totp_secret.as_deref().unwrap_or_default()
        } else {
            ""
        };
        for part in [
            self.normalized_base_url().as_str(),
            self.username.as_str(),
            self.password.as_str(),
            if self.need_2fa { "2fa" } else { "" },
            totp_secret,
            self.session_name.as_str(),
        ] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// TOTP generator for the configured secret, when 2FA is enabled.
    pub fn totp(&self) -> SynologyResult<Option<TotpGenerator>> {
        if !self.need_2fa {
            return Ok(None);
        }
        let secret = self
            .totp_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                SynologyError::invalid_secret("2FA is enabled but no TOTP secret is configured")
            })?;
        TotpGenerator::new(secret).map(Some)
    }

    pub fn validate(&self) -> SynologyResult<()> {
        if self.base_url().is_empty() {
            return Err(SynologyError::invalid_config("URL must not be empty"));
        }
        let parsed = url::Url::parse(self.base_url())
            .map_err(|e| SynologyError::invalid_config(format!("Invalid URL '{}': {}", self.url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SynologyError::invalid_config(format!(
                "Unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }
        if self.username.is_empty() {
            return Err(SynologyError::invalid_config("Username must not be empty"));
        }
        if self.password.is_empty() {
            return Err(SynologyError::invalid_config("Password must not be empty"));
        }
        if self.timeout_seconds == 0 {
            return Err(SynologyError::invalid_config("Timeout must be at least one second"));
        }
        self.totp()?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Upload request
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// File content supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    Binary(Vec<u8>),
    /// Sent as UTF-8.
    Text(String),
}

impl UploadPayload {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Binary(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for UploadPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<String> for UploadPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for UploadPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Destination folder, starting with a shared folder (e.g. `/home/reports`).
    pub path: String,
    pub create_parents: bool,
    pub overwrite: bool,
    pub filename: String,
    pub payload: UploadPayload,
}

impl UploadRequest {
    /// New request with `create_parents` and `overwrite` enabled.
    pub fn new(
        path: impl Into<String>,
        filename: impl Into<String>,
        payload: impl Into<UploadPayload>,
    ) -> Self {
        Self {
            path: path.into(),
            create_parents: true,
            overwrite: true,
            filename: filename.into(),
            payload: payload.into(),
        }
    }

    pub fn with_create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Batch policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What a batch does when one item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Record the failure against the item and keep going.
    ContinueOnFail,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYNO.FileStation.Info
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `data` of a `SYNO.FileStation.Info` / `get` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileStationInfo {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub is_manager: bool,
    #[serde(default)]
    pub support_sharing: bool,
    /// Comma-separated protocol list on DSM 6, absent on some DSM 7 builds.
    #[serde(default)]
    pub support_virtual_protocol: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynologyErrorKind;

    fn config() -> SynologyConfig {
        SynologyConfig::new("https://nas.example.com:5001/", "admin", "hunter2")
    }

    #[test]
    fn trailing_slashes_are_normalised() {
        assert_eq!(config().base_url(), "https://nas.example.com:5001");
        assert_eq!(
            config().entry_url(),
            "https://nas.example.com:5001/webapi/entry.cgi"
        );
        let doubled = SynologyConfig::new("http://nas//", "a", "b");
        assert_eq!(doubled.entry_url(), "http://nas/webapi/entry.cgi");
    }

    #[test]
    fn cache_key_ignores_trailing_slash_and_host_case() {
        let a = SynologyConfig::new("https://NAS.example.com/", "admin", "x");
        let b = SynologyConfig::new("https://nas.example.com", "admin", "x");
        assert_eq!(a.cache_key(), b.cache_key());
        let c = SynologyConfig::new("https://nas.example.com", "guest", "x");
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn cache_key_covers_every_credential_field() {
        let base = SynologyConfig::new("https://nas.example.com", "admin", "x");

        let mut other_password = base.clone();
        other_password.password = "y".into();
        assert_ne!(base.cache_key(), other_password.cache_key());

        let with_2fa = base.clone().with_totp_secret("JBSWY3DPEHPK3PXP");
        assert_ne!(base.cache_key(), with_2fa.cache_key());
        let other_secret = base.clone().with_totp_secret("GEZDGNBVGY3TQOJQ");
        assert_ne!(with_2fa.cache_key(), other_secret.cache_key());

        let mut other_session = base.clone();
        other_session.session_name = "Backup".into();
        assert_ne!(base.cache_key(), other_session.cache_key());

        // field boundaries are unambiguous
        let ab = SynologyConfig::new("https://nas.example.com", "ad", "minx");
        assert_ne!(base.cache_key(), ab.cache_key());

        let key = base.cache_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn path_case_is_preserved_in_normalized_url() {
        let cfg = SynologyConfig::new("HTTPS://NAS.Example.com:5001/DSM/", "a", "b");
        assert_eq!(cfg.normalized_base_url(), "https://nas.example.com:5001/DSM");
        let lower = SynologyConfig::new("https://nas.example.com:5001/dsm", "a", "b");
        assert_ne!(cfg.cache_key(), lower.cache_key());
    }

    #[test]
    fn default_config() {
        let cfg = SynologyConfig::default();
        assert_eq!(cfg.session_name, "SortOfRemoteNG");
        assert_eq!(cfg.timeout_seconds, 30);
        assert!(!cfg.need_2fa);
        assert!(!cfg.accept_invalid_certs);
        assert!(cfg.session_max_age_secs.is_none());
    }

    #[test]
    fn deserialise_with_defaults() {
        let cfg: SynologyConfig = serde_json::from_str(
            r#"{"url":"https://nas","username":"u","password":"p","need2fa":true,"totpSecret":"JBSWY3DPEHPK3PXP"}"#,
        )
        .unwrap();
        assert!(cfg.need_2fa);
        assert_eq!(cfg.totp_secret.as_deref(), Some("JBSWY3DPEHPK3PXP"));
        assert_eq!(cfg.timeout_seconds, 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut cfg = config();
        cfg.url = "/".into();
        assert_eq!(cfg.validate().unwrap_err().kind, SynologyErrorKind::InvalidConfig);

        let mut cfg = config();
        cfg.username.clear();
        assert_eq!(cfg.validate().unwrap_err().kind, SynologyErrorKind::InvalidConfig);

        let mut cfg = config();
        cfg.password.clear();
        assert_eq!(cfg.validate().unwrap_err().kind, SynologyErrorKind::InvalidConfig);

        let cfg = SynologyConfig::new("ftp://nas", "a", "b");
        assert_eq!(cfg.validate().unwrap_err().kind, SynologyErrorKind::InvalidConfig);

        let cfg = SynologyConfig::new("not a url", "a", "b");
        assert_eq!(cfg.validate().unwrap_err().kind, SynologyErrorKind::InvalidConfig);
    }

    #[test]
    fn validate_checks_totp_secret() {
        assert!(config().with_totp_secret("JBSWY3DPEHPK3PXP").validate().is_ok());

        let bad = config().with_totp_secret("not*base32");
        assert_eq!(bad.validate().unwrap_err().kind, SynologyErrorKind::InvalidSecret);

        let mut missing = config();
        missing.need_2fa = true;
        assert_eq!(missing.validate().unwrap_err().kind, SynologyErrorKind::InvalidSecret);

        // a stale secret is ignored while 2FA is off
        let mut off = config();
        off.totp_secret = Some("not*base32".into());
        assert!(off.validate().is_ok());
        assert!(off.totp().unwrap().is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = config().with_totp_secret("JBSWY3DPEHPK3PXP");
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("JBSWY3DPEHPK3PXP"));
        assert!(dbg.contains("admin"));
    }

    #[test]
    fn upload_request_defaults_and_builders() {
        let req = UploadRequest::new("/home", "a.txt", "hello");
        assert!(req.create_parents);
        assert!(req.overwrite);
        assert_eq!(req.payload, UploadPayload::Text("hello".into()));

        let req = req.with_create_parents(false).with_overwrite(false);
        assert!(!req.create_parents);
        assert!(!req.overwrite);
    }

    #[test]
    fn text_payload_is_utf8() {
        let payload = UploadPayload::from("héllo");
        assert_eq!(payload.len(), 6);
        assert_eq!(payload.into_bytes(), "héllo".as_bytes().to_vec());
        assert!(UploadPayload::Binary(Vec::new()).is_empty());
    }

    #[test]
    fn file_station_info_tolerates_missing_fields() {
        let info: FileStationInfo =
            serde_json::from_str(r#"{"hostname":"nas","is_manager":true}"#).unwrap();
        assert_eq!(info.hostname, "nas");
        assert!(info.is_manager);
        assert!(!info.support_sharing);
        assert!(info.support_virtual_protocol.is_none());
    }

    #[test]
    fn batch_policy_serialises_snake_case() {
        assert_eq!(
            serde_json::to_string(&BatchPolicy::ContinueOnFail).unwrap(),
            "\"continue_on_fail\""
        );
        assert_eq!(BatchPolicy::default(), BatchPolicy::Abort);
    }
}
