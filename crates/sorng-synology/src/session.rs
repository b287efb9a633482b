//! Session cache.
//!
//! One slot per credential, keyed by [`SynologyConfig::cache_key`]. The slot's async
//! mutex is held across the login exchange, so concurrent callers that miss
//! at the same time wait for a single login and then share its token.

use crate::auth::SessionAuthenticator;
use crate::error::SynologyResult;
use crate::types::SynologyConfig;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A token obtained from a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub sid: String,
    pub obtained_at: DateTime<Utc>,
}

impl Session {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            obtained_at: Utc::now(),
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.obtained_at).num_seconds()
    }

    /// Whether the session is older than `max_age_secs`. Without a limit a
    /// session never expires locally.
    pub fn is_expired(&self, max_age_secs: Option<u64>) -> bool {
        match max_age_secs {
            Some(max) => self.age_seconds() >= i64::try_from(max).unwrap_or(i64::MAX),
            None => false,
        }
    }
}

/// Shorten a session id for log output.
pub fn mask_sid(sid: &str) -> String {
    let chars: Vec<char> = sid.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}

type Slot = Arc<Mutex<Option<Session>>>;

pub struct SessionCache {
    authenticator: Arc<dyn SessionAuthenticator>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl SessionCache {
    pub fn new(authenticator: Arc<dyn SessionAuthenticator>) -> Self {
        Self {
            authenticator,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, config: &SynologyConfig) -> Slot {
        let mut slots = self.slots.lock().await;
        slots
            .entry(config.cache_key())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Cached token for `config`, logging in first when there is none or
    /// the cached one has outlived `session_max_age_secs`.
    pub async fn get_token(&self, config: &SynologyConfig) -> SynologyResult<String> {
        let slot = self.slot(config).await;
        let mut current = slot.lock().await;

        if let Some(session) = current.as_ref() {
            if !session.is_expired(config.session_max_age_secs) {
                return Ok(session.sid.clone());
            }
            debug!(
                "Retiring session {} after {}s",
                mask_sid(&session.sid),
                session.age_seconds()
            );
        }
        *current = None;

        let sid = self.authenticator.login(config).await?;
        debug!(
            "Cached session {} for {} as {}",
            mask_sid(&sid),
            config.base_url(),
            config.username
        );
        *current = Some(Session::new(sid.clone()));
        Ok(sid)
    }

    /// Drop the cached session if it is still `stale_sid`. Returns whether
    /// anything was removed; a newer token is left alone.
    pub async fn invalidate(&self, config: &SynologyConfig, stale_sid: &str) -> bool {
        let slot = self.slot(config).await;
        let mut current = slot.lock().await;
        match current.as_ref() {
            Some(session) if session.sid == stale_sid => {
                debug!("Invalidated session {}", mask_sid(stale_sid));
                *current = None;
                true
            }
            _ => false,
        }
    }

    /// Remove and return the cached session.
    pub async fn clear(&self, config: &SynologyConfig) -> Option<Session> {
        let slot = self.slot(config).await;
        let mut current = slot.lock().await;
        current.take()
    }

    /// Peek at the cached session without logging in.
    pub async fn cached(&self, config: &SynologyConfig) -> Option<Session> {
        let slot = self.slot(config).await;
        let current = slot.lock().await;
        current.clone()
    }

    /// Clear the cached session and end it on the server. Returns `false`
    /// when there was nothing to log out. The cache is cleared even when
    /// the server call fails.
    pub async fn logout(&self, config: &SynologyConfig) -> SynologyResult<bool> {
        let Some(session) = self.clear(config).await else {
            return Ok(false);
        };
        if let Err(e) = self.authenticator.logout(config, &session.sid).await {
            warn!("Logout of session {} failed: {}", mask_sid(&session.sid), e);
            return Err(e);
        }
        Ok(true)
    }
}
