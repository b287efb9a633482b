//! `SYNO.API.Auth` login and logout.

use crate::envelope::{interpret, OperationResult};
use crate::error::{describe_error_code, ApiScope, SynologyError, SynologyResult};
use crate::request::ApiRequest;
use crate::transport::ApiTransport;
use crate::types::*;
use log::{debug, info, warn};
use std::sync::Arc;

/// Obtains and releases session tokens for a credential.
#[async_trait::async_trait]
pub trait SessionAuthenticator: Send + Sync {
    async fn login(&self, config: &SynologyConfig) -> SynologyResult<String>;
    async fn logout(&self, config: &SynologyConfig, sid: &str) -> SynologyResult<()>;
}

/// Authenticator speaking `SYNO.API.Auth` v6.
#[derive(Clone)]
pub struct DsmAuthenticator {
    transport: Arc<dyn ApiTransport>,
}

impl DsmAuthenticator {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Login request for `config`. A fresh OTP is computed on every call
    /// when 2FA is enabled.
    pub fn login_request(config: &SynologyConfig) -> SynologyResult<ApiRequest> {
        let mut request = ApiRequest::get(config.entry_url(), ApiScope::Auth)
            .api(AUTH_API, AUTH_VERSION, "login")
            .param("account", config.username.as_str())
            .param("passwd", config.password.as_str())
            .param("session", config.session_name.as_str())
            .param("format", "sid");
        if let Some(totp) = config.totp()? {
            request = request.param("otp_code", totp.generate()?.code);
        }
        Ok(request)
    }

    pub fn logout_request(config: &SynologyConfig, sid: &str) -> ApiRequest {
        ApiRequest::get(config.entry_url(), ApiScope::Auth)
            .api(AUTH_API, AUTH_VERSION, "logout")
            .param("session", config.session_name.as_str())
            .with_sid(sid)
    }
}

#[async_trait::async_trait]
impl SessionAuthenticator for DsmAuthenticator {
    async fn login(&self, config: &SynologyConfig) -> SynologyResult<String> {
        let request = Self::login_request(config)?;
        debug!(
            "Logging in to {} as {} (2fa: {})",
            config.base_url(),
            config.username,
            config.need_2fa
        );

        let envelope = self.transport.send(request).await?;
        match interpret(envelope, ApiScope::Auth)? {
            OperationResult::Success { data } => {
                let sid = data
                    .get("sid")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| SynologyError::protocol("Login response carries no sid"))?;
                info!("Logged in to {} as {}", config.base_url(), config.username);
                Ok(sid.to_string())
            }
            OperationResult::Failure {
                error_code,
                message,
            } => {
                warn!(
                    "Login to {} as {} rejected: {} ({})",
                    config.base_url(),
                    config.username,
                    message,
                    error_code
                );
                Err(SynologyError::auth_failed(error_code, message))
            }
        }
    }

    async fn logout(&self, config: &SynologyConfig, sid: &str) -> SynologyResult<()> {
        let envelope = self
            .transport
            .send(Self::logout_request(config, sid))
            .await?;
        // DSM answers a logout with `{"success":true}` and no data.
        if envelope.success {
            debug!("Logged out of {} as {}", config.base_url(), config.username);
            return Ok(());
        }
        match envelope.error.and_then(|e| e.code) {
            Some(code) => Err(SynologyError::service(
                code,
                describe_error_code(ApiScope::Auth, code),
            )),
            None => Err(SynologyError::protocol(
                "Envelope reports failure but carries no error code",
            )),
        }
    }
}
