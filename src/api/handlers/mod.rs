//! Route handlers and shared request/response helpers.
//!
//! Denials coming out of the session gate are shaped here: machine callers
//! (JSON) get a structured 401 with a redirect hint, browsers get a redirect
//! to the login page. The body text never distinguishes why a check failed.

pub mod admin;
pub mod contact;
pub mod health;
pub mod pages;
pub mod resume;

use crate::security::session::{DenyReason, SESSION_COOKIE_NAME};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE, COOKIE, InvalidHeaderValue},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Redirect, Response},
};
use regex::Regex;
use serde_json::json;

pub const LOGIN_PATH: &str = "/admin/login";

/// Lightweight email sanity check used before relaying contact mail.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Extract a client IP for audit events from common proxy headers.
#[must_use]
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Pull the admin session token out of the cookie header, if present.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

/// Build the `HttpOnly` session cookie.
pub(crate) fn session_cookie(
    token: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}"
    ))
}

pub(crate) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("vetrina_admin=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

/// Machine callers announce themselves with a JSON accept or content type.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    let header_contains_json = |name| {
        headers
            .get(name)
            .and_then(|value: &HeaderValue| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"))
    };
    header_contains_json(ACCEPT)
        || header_contains_json(CONTENT_TYPE)
        || headers
            .get("x-requested-with")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("xmlhttprequest"))
}

/// Run the session gate for a request, shaping the denial when it fails.
pub(crate) async fn require_admin(
    headers: &HeaderMap,
    gate: &crate::security::session::SessionGate,
    path: &str,
) -> Result<(), Response> {
    let token = session_token(headers);
    match gate.require_admin(token.as_deref()).await {
        Ok(()) => Ok(()),
        Err(reason) => {
            crate::audit::unauthorized_access(
                reason.as_str(),
                path,
                extract_client_ip(headers).as_deref(),
            );
            Err(deny_response(headers, reason))
        }
    }
}

/// Shape a gate denial without revealing which check failed.
pub(crate) fn deny_response(headers: &HeaderMap, reason: DenyReason) -> Response {
    let message = match reason {
        DenyReason::NoSession | DenyReason::SessionExpired => "Authentication required",
        DenyReason::BadCredential => "Invalid or expired credential.",
    };

    if wants_json(headers) {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "message": message,
                "redirect": LOGIN_PATH,
            })),
        )
            .into_response()
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn session_token_parses_cookie_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; vetrina_admin=tok123; lang=en"),
        );
        assert_eq!(session_token(&headers), Some("tok123".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn wants_json_detects_machine_callers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(wants_json(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        assert!(wants_json(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));
    }

    #[test]
    fn deny_response_redirects_browsers_and_401s_machines() {
        use crate::security::session::DenyReason;

        let headers = HeaderMap::new();
        let response = deny_response(&headers, DenyReason::NoSession);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let response = deny_response(&headers, DenyReason::SessionExpired);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
