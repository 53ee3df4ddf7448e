//! Session access gate in front of the admin routes.
//!
//! A successful credential check opens a server-side session addressed by a
//! random cookie token; only the token's SHA-256 hash is kept. The session
//! lifetime is a separate policy value from the credential rotation interval:
//! a session opened just before a rotation stays valid for its own timeout
//! window even though the credential it was checked against is gone.
//!
//! Per-session state machine: Anonymous -> (login ok) -> Authenticated ->
//! (timeout | logout) -> Anonymous. Nothing else.

use crate::{audit, security::credentials::CredentialManager};
use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::error;

pub const SESSION_COOKIE_NAME: &str = "vetrina_admin";

/// Why an admin check was denied. A value, never an error; handlers use it
/// for response shaping while the user-facing message stays generic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    NoSession,
    SessionExpired,
    BadCredential,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::SessionExpired => "session_expired",
            Self::BadCredential => "bad_credential",
        }
    }
}

/// Login outcome split by audience: a denial is shaped for the caller, an
/// internal failure (the token RNG, nothing else today) must never masquerade
/// as one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginError {
    Denied(DenyReason),
    Internal,
}

#[derive(Clone, Debug)]
struct AdminSession {
    authenticated: bool,
    login_time: DateTime<Utc>,
}

pub struct SessionGate {
    credentials: Arc<CredentialManager>,
    timeout: Duration,
    sessions: Mutex<HashMap<[u8; 32], AdminSession>>,
}

impl SessionGate {
    #[must_use]
    pub fn new(credentials: Arc<CredentialManager>, timeout_hours: u64) -> Self {
        Self {
            credentials,
            // try_hours: chrono's constructor panics out of range, and the
            // timeout arrives straight from the CLI.
            timeout: i64::try_from(timeout_hours)
                .ok()
                .and_then(Duration::try_hours)
                .unwrap_or(Duration::MAX),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Check the attempt against the rotating credential and, on success,
    /// open a session. The raw token is only handed to the caller to set the
    /// cookie; the store keeps its hash.
    ///
    /// # Errors
    /// `Denied(BadCredential)` on a mismatching or expired credential, with
    /// no session state touched; `Internal` if the token RNG fails.
    pub async fn login(&self, attempt: &str, origin: Option<&str>) -> Result<String, LoginError> {
        if !self.credentials.validate(attempt).await {
            audit::login_denied(DenyReason::BadCredential.as_str(), origin);
            return Err(LoginError::Denied(DenyReason::BadCredential));
        }

        let token = match generate_session_token() {
            Ok(token) => token,
            Err(err) => {
                error!("failed to generate session token: {err:#}");
                return Err(LoginError::Internal);
            }
        };

        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        // Each login sweeps records past the timeout so abandoned sessions
        // cannot pile up in the map.
        sessions.retain(|_, session| now - session.login_time <= self.timeout);
        sessions.insert(
            hash_session_token(&token),
            AdminSession {
                authenticated: true,
                login_time: now,
            },
        );
        drop(sessions);

        audit::login_success(origin);

        Ok(token)
    }

    /// Gate an admin operation on an existing session.
    ///
    /// # Errors
    /// `NoSession` without a prior login, `SessionExpired` once the timeout
    /// has passed; the expired record is cleared as a side effect.
    pub async fn require_admin(&self, token: Option<&str>) -> Result<(), DenyReason> {
        self.require_admin_at(token, Utc::now()).await
    }

    async fn require_admin_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), DenyReason> {
        let Some(token) = token else {
            return Err(DenyReason::NoSession);
        };
        let key = hash_session_token(token);

        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get(&key) else {
            return Err(DenyReason::NoSession);
        };

        if !session.authenticated {
            sessions.remove(&key);
            return Err(DenyReason::NoSession);
        }

        if now - session.login_time > self.timeout {
            sessions.remove(&key);
            drop(sessions);
            audit::session_expired();
            return Err(DenyReason::SessionExpired);
        }

        Ok(())
    }

    /// Drop all state for the token. Returns whether an authenticated
    /// session existed.
    pub async fn logout(&self, token: Option<&str>, origin: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };

        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(&hash_session_token(token))
        };

        let was_authenticated = removed.is_some_and(|session| session.authenticated);
        if was_authenticated {
            audit::logout(origin);
        }
        was_authenticated
    }

    #[must_use]
    pub fn timeout_seconds(&self) -> i64 {
        self.timeout.num_seconds()
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn set_login_time(&self, token: &str, login_time: DateTime<Utc>) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&hash_session_token(token)) {
            session.login_time = login_time;
        }
    }
}

/// New random session token for the auth cookie; the store only ever sees
/// its hash.
fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn hash_session_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}
