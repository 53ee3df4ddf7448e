//! Self-rotating admin credential.
//!
//! A single in-memory credential (SHA-256 hash + issuance time) guards the
//! admin surface. In production a fresh secret is generated at startup and
//! on every rotation tick, delivered to the operator by email, and expires
//! after the rotation interval. The plaintext only exists while the email is
//! being composed; only the hash is retained.
//!
//! Rotation ordering matters: the replacement credential is computed first,
//! delivery is attempted without holding the credential lock, and the swap
//! happens only after delivery succeeds. A failed delivery leaves the old
//! credential authoritative until the next tick. Readers therefore always
//! see a complete pre- or post-rotation snapshot, never a mixture.

use crate::{
    audit,
    email::{deliver, EmailMessage, EmailSender},
    error::Error,
};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::interval,
};
use tracing::{info, warn};

/// Fixed development-mode secret; never used outside `--dev`.
pub const DEV_SECRET: &str = "admin123";

const SECRET_LENGTH: usize = 12;
const SECRET_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

#[derive(Clone, Copy, Debug)]
pub struct RotationPolicy {
    pub interval_minutes: u64,
    pub development_mode: bool,
}

/// Hash + issuance time, replaced as a single unit on rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    hash: [u8; 32],
    issued_at: DateTime<Utc>,
}

impl Credential {
    fn from_secret(secret: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            hash: hash_secret(secret),
            issued_at,
        }
    }

    fn matches(&self, attempt: &str) -> bool {
        hash_secret(attempt).ct_eq(&self.hash).into()
    }

    fn is_expired_at(&self, now: DateTime<Utc>, policy: &RotationPolicy) -> bool {
        if policy.development_mode {
            return false;
        }
        // try_minutes: chrono's constructor panics out of range, and the
        // interval arrives straight from the CLI.
        let interval = i64::try_from(policy.interval_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or(Duration::MAX);
        now - self.issued_at > interval
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

fn hash_secret(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

fn generate_secret() -> SecretString {
    let mut rng = OsRng;
    let secret: String = (0..SECRET_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..SECRET_CHARSET.len());
            SECRET_CHARSET[idx] as char
        })
        .collect();
    SecretString::from(secret)
}

fn rotation_notice(recipient: &str, secret: &str, interval_minutes: u64) -> EmailMessage {
    let html_body = format!(
        r#"<html>
<body>
    <h2>Portfolio Admin Access</h2>
    <p>Your new temporary admin password has been generated:</p>
    <p><strong style="font-size: 18px; color: #007bff;">{secret}</strong></p>
    <p>This password will expire in {interval_minutes} minutes.</p>
    <p>Generated at: {}</p>
    <hr>
    <p><em>This is an automated message from your Portfolio Admin System.</em></p>
</body>
</html>"#,
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
    );

    EmailMessage {
        to: recipient.to_string(),
        subject: "Portfolio Admin - New Temporary Password".to_string(),
        html_body,
    }
}

pub struct CredentialManager {
    policy: RotationPolicy,
    recipient: String,
    sender: Arc<dyn EmailSender>,
    current: RwLock<Credential>,
    // At most one rotation in flight; held across compute, deliver, and
    // swap so a manual rotation racing the timer cannot leave the stored
    // hash behind a stale notice.
    rotation: Mutex<()>,
}

impl CredentialManager {
    /// First-time credential setup.
    ///
    /// Development mode installs the fixed test secret, logs it once behind
    /// a loud banner, and never arms rotation. Production generates a random
    /// secret and requires successful email delivery before the service may
    /// become reachable; there is no other way for the operator to learn it.
    ///
    /// # Errors
    /// Returns `Error::Delivery` when the initial email cannot be sent.
    pub async fn initialize(
        policy: RotationPolicy,
        recipient: String,
        sender: Arc<dyn EmailSender>,
    ) -> Result<Arc<Self>, Error> {
        if policy.development_mode {
            warn!("DEVELOPMENT MODE: rotation disabled, using the fixed test credential");
            warn!("DEVELOPMENT CREDENTIAL: {DEV_SECRET}");
            warn!("this credential never expires; do not enable development mode in production");

            return Ok(Arc::new(Self {
                policy,
                recipient,
                sender,
                current: RwLock::new(Credential::from_secret(DEV_SECRET, Utc::now())),
                rotation: Mutex::new(()),
            }));
        }

        let secret = generate_secret();
        let credential = Credential::from_secret(secret.expose_secret(), Utc::now());
        let notice = rotation_notice(&recipient, secret.expose_secret(), policy.interval_minutes);

        deliver(Arc::clone(&sender), notice).await?;

        info!("admin credential generated and delivered");

        Ok(Arc::new(Self {
            policy,
            recipient,
            sender,
            current: RwLock::new(credential),
            rotation: Mutex::new(()),
        }))
    }

    /// Replace the credential with a fresh one and notify the operator.
    ///
    /// # Errors
    /// Returns `Error::Delivery` on failed delivery; the previous credential
    /// then remains authoritative.
    pub async fn rotate(&self) -> Result<(), Error> {
        // Serialize the whole compute, deliver, swap sequence. Only the
        // final swap touches the credential lock.
        let _in_flight = self.rotation.lock().await;

        let secret = generate_secret();
        let replacement = Credential::from_secret(secret.expose_secret(), Utc::now());
        let notice = rotation_notice(
            &self.recipient,
            secret.expose_secret(),
            self.policy.interval_minutes,
        );
        drop(secret);

        // Delivery happens before the swap and outside the lock, so
        // concurrent validators keep the old credential and never wait on
        // SMTP latency.
        if let Err(e) = deliver(Arc::clone(&self.sender), notice).await {
            audit::rotation(false);
            warn!("credential rotation failed, previous credential stays active: {e}");
            return Err(e);
        }

        *self.current.write().await = replacement;

        audit::rotation(true);
        info!("admin credential rotated and delivered");

        Ok(())
    }

    /// Check a plaintext attempt against the current credential.
    ///
    /// Fails closed: an expired credential denies every attempt, including
    /// the previously valid secret.
    pub async fn validate(&self, attempt: &str) -> bool {
        let current = self.current.read().await.clone();
        let now = Utc::now();

        if current.is_expired_at(now, &self.policy) {
            warn!("admin credential check denied: expired");
            return false;
        }

        if current.matches(attempt) {
            info!("admin credential check granted");
            true
        } else {
            warn!("admin credential check denied: mismatch");
            false
        }
    }

    pub async fn is_expired(&self) -> bool {
        let current = self.current.read().await.clone();
        current.is_expired_at(Utc::now(), &self.policy)
    }

    /// Consistent copy of the current hash + issuance pair.
    pub async fn snapshot(&self) -> Credential {
        self.current.read().await.clone()
    }

    #[must_use]
    pub fn development_mode(&self) -> bool {
        self.policy.development_mode
    }

    /// Arm the recurring rotation timer. Callers keep the handle and abort
    /// it on shutdown; development mode never arms it.
    pub fn spawn_rotation(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let period = std::time::Duration::from_secs(manager.policy.interval_minutes * 60);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick completes immediately; initialization already
            // issued a credential, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = manager.rotate().await {
                    warn!("scheduled rotation failed: {e}");
                }
            }
        })
    }

    #[cfg(test)]
    pub(crate) async fn set_issued_at(&self, issued_at: DateTime<Utc>) {
        self.current.write().await.issued_at = issued_at;
    }
}
