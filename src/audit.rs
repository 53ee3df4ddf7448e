//! Append-only audit sink for security and admin events.
//!
//! Events are emitted as structured `tracing` records under the `audit`
//! target so they can be filtered or shipped independently of application
//! logs. Retention is the subscriber's problem, not ours.

use tracing::{info, warn};

pub fn login_success(origin: Option<&str>) {
    info!(target: "audit", event = "admin_login", origin = origin.unwrap_or("unknown"));
}

pub fn login_denied(reason: &str, origin: Option<&str>) {
    warn!(
        target: "audit",
        event = "admin_login_denied",
        reason,
        origin = origin.unwrap_or("unknown"),
    );
}

pub fn logout(origin: Option<&str>) {
    info!(target: "audit", event = "admin_logout", origin = origin.unwrap_or("unknown"));
}

pub fn session_expired() {
    warn!(target: "audit", event = "admin_session_expired");
}

pub fn unauthorized_access(reason: &str, path: &str, origin: Option<&str>) {
    warn!(
        target: "audit",
        event = "unauthorized_admin_access",
        reason,
        path,
        origin = origin.unwrap_or("unknown"),
    );
}

pub fn rotation(success: bool) {
    if success {
        info!(target: "audit", event = "credential_rotation", outcome = "success");
    } else {
        warn!(target: "audit", event = "credential_rotation", outcome = "failure");
    }
}

pub fn admin_action(action: &str, origin: Option<&str>) {
    info!(
        target: "audit",
        event = "admin_action",
        action,
        origin = origin.unwrap_or("unknown"),
    );
}
