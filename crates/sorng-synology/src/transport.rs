//! HTTP transport abstraction.
//!
//! Everything above this module talks to DSM through the [`ApiTransport`]
//! trait: one request in, one decoded envelope out. [`HttpTransport`] is the
//! `reqwest` back-end; [`SimulatedTransport`] answers from a closure and
//! records what it was sent, for tests and offline use.

use crate::envelope::ApiEnvelope;
use crate::error::{SynologyError, SynologyResult};
use crate::request::ApiRequest;
use crate::types::{SynologyConfig, AUTH_API};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Transport trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sends one request to `entry.cgi` and decodes the response envelope.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` between the authenticator and the client.
#[async_trait::async_trait]
pub trait ApiTransport: Send + Sync {
    /// Fails with `Transport` when no usable HTTP response arrives, and with
    /// `Protocol` when the body is not an envelope.
    async fn send(&self, request: ApiRequest) -> SynologyResult<ApiEnvelope>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  reqwest back-end
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &SynologyConfig) -> SynologyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| SynologyError::transport(format!("HTTP client build error: {}", e)))?;
        Ok(Self { http })
    }

    /// Reuse an existing `reqwest` client (shared pool, custom proxy...).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> SynologyResult<ApiEnvelope> {
        // The query carries the password, OTP and session id: log names only.
        debug!(
            "Synology {} {} api={} method={}",
            request.method,
            request.url,
            request.api_name().unwrap_or("-"),
            request.method_name().unwrap_or("-")
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .query(&request.query);
        if let Some(ref form) = request.form {
            builder = builder.multipart(form.to_multipart()?);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SynologyError::transport(format!(
                "DSM answered HTTP {}",
                status
            )));
        }
        let body = resp.text().await?;
        ApiEnvelope::parse(&body)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Simulated transport (for testing & offline use)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

type Responder = dyn Fn(&ApiRequest) -> SynologyResult<ApiEnvelope> + Send + Sync;

/// In-memory transport answering from a closure.
pub struct SimulatedTransport {
    responder: Box<Responder>,
    latency: Option<Duration>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl SimulatedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> SynologyResult<ApiEnvelope> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            latency: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same envelope.
    pub fn always(envelope: ApiEnvelope) -> Self {
        Self::new(move |_| Ok(envelope.clone()))
    }

    /// Delay every answer, to widen race windows in concurrency tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.sent.lock().await.clone()
    }

    /// Number of requests for the given API and method.
    pub async fn count(&self, api: &str, method: &str) -> usize {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|r| r.api_name() == Some(api) && r.method_name() == Some(method))
            .count()
    }

    pub async fn login_count(&self) -> usize {
        self.count(AUTH_API, "login").await
    }
}

#[async_trait::async_trait]
impl ApiTransport for SimulatedTransport {
    async fn send(&self, request: ApiRequest) -> SynologyResult<ApiEnvelope> {
        let reply = (self.responder)(&request);
        self.sent.lock().await.push(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        reply
    }
}
