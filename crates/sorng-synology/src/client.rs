//! File Station client facade.
//!
//! Wires the session cache, the transport and the response interpreter
//! together. Every authenticated call goes through [`FileStationClient::execute`],
//! which attaches the cached `_sid` and re-authenticates once when DSM
//! reports the session as expired.

use crate::auth::DsmAuthenticator;
use crate::batch::{run_batch, BatchReport};
use crate::envelope::{interpret, OperationResult};
use crate::error::{is_session_error, ApiScope, SynologyError, SynologyResult};
use crate::request::ApiRequest;
use crate::session::{mask_sid, SessionCache};
use crate::transport::{ApiTransport, HttpTransport};
use crate::types::*;
use crate::upload::build_upload_form;
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct FileStationClient {
    config: SynologyConfig,
    transport: Arc<dyn ApiTransport>,
    sessions: Arc<SessionCache>,
}

impl FileStationClient {
    /// Validate `config` and connect over HTTP.
    pub fn new(config: SynologyConfig) -> SynologyResult<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Client over a custom transport with its own session cache.
    pub fn with_transport(config: SynologyConfig, transport: Arc<dyn ApiTransport>) -> Self {
        let authenticator = Arc::new(DsmAuthenticator::new(transport.clone()));
        let sessions = Arc::new(SessionCache::new(authenticator));
        Self::with_parts(config, transport, sessions)
    }

    /// Client sharing an existing session cache, so several clients with the
    /// same credential reuse one login.
    pub fn with_parts(
        config: SynologyConfig,
        transport: Arc<dyn ApiTransport>,
        sessions: Arc<SessionCache>,
    ) -> Self {
        Self {
            config,
            transport,
            sessions,
        }
    }

    pub fn config(&self) -> &SynologyConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionCache> {
        &self.sessions
    }

    /// Send an authenticated request and interpret the answer.
    ///
    /// On a session error (106, 107, 119) the token is invalidated and the
    /// request is sent once more with a fresh one. A second session error
    /// becomes `AuthenticationFailed`.
    pub async fn execute(&self, request: ApiRequest) -> SynologyResult<OperationResult> {
        let scope = request.scope;
        let sid = self.sessions.get_token(&self.config).await?;
        let envelope = self.transport.send(request.clone().with_sid(&sid)).await?;
        let result = interpret(envelope, scope)?;

        let code = match result.error_code() {
            Some(code) if is_session_error(code) => code,
            _ => return Ok(result),
        };
        debug!(
            "Session {} rejected with {}, logging in again",
            mask_sid(&sid),
            code
        );
        self.sessions.invalidate(&self.config, &sid).await;

        let sid = self.sessions.get_token(&self.config).await?;
        let envelope = self.transport.send(request.with_sid(&sid)).await?;
        match interpret(envelope, scope)? {
            OperationResult::Failure {
                error_code,
                message,
            } if is_session_error(error_code) => {
                warn!(
                    "Fresh session for {} rejected with {}",
                    self.config.username, error_code
                );
                self.sessions.invalidate(&self.config, &sid).await;
                Err(SynologyError::auth_failed(error_code, message))
            }
            result => Ok(result),
        }
    }

    /// Upload one file. Returns the `data` of the success envelope.
    pub async fn upload(&self, request: UploadRequest) -> SynologyResult<Value> {
        let form = build_upload_form(request)?;
        info!(
            "Uploading {} ({} bytes) to {}",
            form.file().filename,
            form.file().content.len(),
            form.path()
        );
        let request = ApiRequest::post_form(self.config.entry_url(), ApiScope::FileStation, form);
        self.execute(request).await?.into_result()
    }

    /// Authenticated `SYNO.FileStation.Info` probe.
    pub async fn test_connection(&self) -> SynologyResult<FileStationInfo> {
        let request = ApiRequest::get(self.config.entry_url(), ApiScope::FileStation)
            .api(INFO_API, INFO_VERSION, "get");
        let data = self.execute(request).await?.into_result()?;
        let info: FileStationInfo = serde_json::from_value(data)?;
        info!(
            "Connected to {} (hostname {}, manager: {})",
            self.config.base_url(),
            info.hostname,
            info.is_manager
        );
        Ok(info)
    }

    /// End the cached session, if any.
    pub async fn logout(&self) -> SynologyResult<bool> {
        self.sessions.logout(&self.config).await
    }

    /// Upload several files in order. See [`run_batch`].
    pub async fn upload_batch(
        &self,
        items: Vec<UploadRequest>,
        policy: BatchPolicy,
        cancel: &CancellationToken,
    ) -> SynologyResult<BatchReport> {
        run_batch(self, items, policy, cancel).await
    }
}
