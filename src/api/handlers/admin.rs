//! Gated admin endpoints: login, logout, content editing, manual credential
//! rotation, and backup/restore.

use super::{
    clear_session_cookie, deny_response, extract_client_ip, require_admin, session_cookie,
    session_token,
};
use crate::{
    audit, backup,
    content::ContentStore,
    security::session::{LoginError, SessionGate},
};
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub password: String,
}

/// Exchange the current admin password for a session cookie.
pub async fn login(
    headers: HeaderMap,
    gate: Extension<Arc<SessionGate>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let origin = extract_client_ip(&headers);

    match gate.0.login(&request.password, origin.as_deref()).await {
        Ok(token) => {
            let Ok(cookie) = session_cookie(&token, gate.0.timeout_seconds()) else {
                error!("Failed to build session cookie");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            };

            let mut response = Json(json!({
                "success": true,
                "redirect": "/admin",
            }))
            .into_response();
            response.headers_mut().insert(SET_COOKIE, cookie);
            response
        }
        Err(LoginError::Denied(reason)) => deny_response(&headers, reason),
        Err(LoginError::Internal) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Drop the current session and clear the cookie.
pub async fn logout(headers: HeaderMap, gate: Extension<Arc<SessionGate>>) -> Response {
    let origin = extract_client_ip(&headers);
    let token = session_token(&headers);
    gate.0.logout(token.as_deref(), origin.as_deref()).await;

    let mut response = Json(json!({
        "success": true,
        "message": "Logged out successfully.",
    }))
    .into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, clear_session_cookie());
    response
}

/// Report whether the caller currently holds a valid admin session.
pub async fn session_status(headers: HeaderMap, gate: Extension<Arc<SessionGate>>) -> Response {
    let token = session_token(&headers);
    let authenticated = gate.0.require_admin(token.as_deref()).await.is_ok();
    Json(json!({ "authenticated": authenticated })).into_response()
}

/// Overwrite a content section with the submitted JSON document.
pub async fn save_content(
    headers: HeaderMap,
    Path(section): Path<String>,
    gate: Extension<Arc<SessionGate>>,
    store: Extension<Arc<ContentStore>>,
    Json(value): Json<Value>,
) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/content").await {
        return denied;
    }

    if !ContentStore::is_valid_section(&section) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Invalid section" })),
        )
            .into_response();
    }

    match store.0.save(&section, &value).await {
        Ok(()) => {
            audit::admin_action(
                &format!("Updated {section} content"),
                extract_client_ip(&headers).as_deref(),
            );

            Json(json!({
                "success": true,
                "message": "Content saved successfully",
            }))
            .into_response()
        }
        Err(err) => {
            error!("Error saving {section} content: {err}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Failed to save content" })),
            )
                .into_response()
        }
    }
}

/// Rotate the admin credential on demand. The old password stops working
/// only once the new one has been emailed.
pub async fn rotate_credential(headers: HeaderMap, gate: Extension<Arc<SessionGate>>) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/rotate").await {
        return denied;
    }

    match gate.0.credentials().rotate().await {
        Ok(()) => {
            audit::admin_action(
                "Password manually regenerated",
                extract_client_ip(&headers).as_deref(),
            );

            Json(json!({
                "success": true,
                "message": "New password generated and sent to your email.",
            }))
            .into_response()
        }
        Err(err) => {
            error!("Manual credential rotation failed: {err}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Failed to generate new password.",
                })),
            )
                .into_response()
        }
    }
}

/// Download every content section plus settings as a single JSON bundle.
pub async fn download_backup(
    headers: HeaderMap,
    gate: Extension<Arc<SessionGate>>,
    store: Extension<Arc<ContentStore>>,
) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/backup").await {
        return denied;
    }

    match backup::create(&store.0).await {
        Ok((filename, bytes)) => {
            audit::admin_action(
                &format!("Data backup created: {filename}"),
                extract_client_ip(&headers).as_deref(),
            );

            (
                [
                    (CONTENT_TYPE, "application/json".to_string()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => {
            error!("Backup creation failed: {err}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Backup failed" })),
            )
                .into_response()
        }
    }
}

/// Replace the content store from an uploaded backup bundle. The current
/// data is snapshotted first so a bad restore is recoverable.
pub async fn restore_backup(
    headers: HeaderMap,
    gate: Extension<Arc<SessionGate>>,
    store: Extension<Arc<ContentStore>>,
    body: Bytes,
) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/restore").await {
        return denied;
    }

    match backup::restore(&store.0, &body).await {
        Ok(restored) => {
            audit::admin_action(
                "Data restored from backup",
                extract_client_ip(&headers).as_deref(),
            );

            Json(json!({
                "success": true,
                "message": "Data restored successfully!",
                "restored": restored,
            }))
            .into_response()
        }
        Err(err) => {
            error!("Restore failed: {err}");

            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Restore failed. Please check the backup file and try again.",
                })),
            )
                .into_response()
        }
    }
}
