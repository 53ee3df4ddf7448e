//! Resume file management: gated upload/list/delete plus the public
//! download endpoints.

use super::{extract_client_ip, require_admin};
use crate::{audit, security::session::SessionGate, settings::Settings};
use axum::{
    extract::{Extension, Multipart, Path},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::fs;
use tracing::error;

const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_FILES: [&str; 2] = ["resume.pdf", "resume.docx"];
const WORD_TYPES: [&str; 2] = [
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

fn files_dir(settings: &Settings) -> std::path::PathBuf {
    settings.assets_dir().join("files")
}

fn bad_upload(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// Accept `pdfFile` and/or `wordFile` multipart parts and store them under
/// fixed names inside the assets directory.
pub async fn upload(
    headers: HeaderMap,
    gate: Extension<Arc<SessionGate>>,
    settings: Extension<Arc<Settings>>,
    mut multipart: Multipart,
) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/resume").await {
        return denied;
    }

    let dir = files_dir(&settings.0);
    if let Err(err) = fs::create_dir_all(&dir).await {
        error!("Failed to create upload directory: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "Upload error" })),
        )
            .into_response();
    }

    let origin = extract_client_ip(&headers);
    let mut uploaded = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                error!("Resume upload error: {err}");
                return bad_upload("Malformed upload");
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        let target = match name.as_str() {
            "pdfFile" => {
                if content_type != "application/pdf" {
                    return bad_upload("PDF file must be in PDF format");
                }
                "resume.pdf"
            }
            "wordFile" => {
                if !WORD_TYPES.contains(&content_type.as_str()) {
                    return bad_upload("Word file must be in DOC or DOCX format");
                }
                "resume.docx"
            }
            _ => continue,
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("Resume upload error: {err}");
                return bad_upload("Malformed upload");
            }
        };

        if bytes.len() > MAX_RESUME_BYTES {
            return bad_upload("File too large (max 10MB)");
        }

        if bytes.is_empty() {
            continue;
        }

        if let Err(err) = fs::write(dir.join(target), &bytes).await {
            error!("Failed to store {target}: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Upload error" })),
            )
                .into_response();
        }

        audit::admin_action(&format!("Resume uploaded: {target}"), origin.as_deref());
        uploaded.push(target.to_string());
    }

    if uploaded.is_empty() {
        return bad_upload("No valid files uploaded");
    }

    Json(json!({
        "success": true,
        "message": format!("Successfully uploaded: {}", uploaded.join(", ")),
        "files": uploaded,
    }))
    .into_response()
}

/// List which resume files are currently available with a readable size.
pub async fn list(
    headers: HeaderMap,
    gate: Extension<Arc<SessionGate>>,
    settings: Extension<Arc<Settings>>,
) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/resume").await {
        return denied;
    }

    let dir = files_dir(&settings.0);
    let mut files = Vec::new();

    for (name, kind) in [("resume.pdf", "pdf"), ("resume.docx", "word")] {
        if let Ok(meta) = fs::metadata(dir.join(name)).await {
            #[allow(clippy::cast_precision_loss)]
            let megabytes = meta.len() as f64 / (1024.0 * 1024.0);
            files.push(json!({
                "name": name,
                "type": kind,
                "size": format!("{megabytes:.1} MB"),
            }));
        }
    }

    Json(json!({ "success": true, "files": files })).into_response()
}

#[derive(Deserialize, Debug)]
pub struct DeleteRequest {
    pub filename: String,
}

/// Delete one of the two managed resume files. Anything else is rejected.
pub async fn remove(
    headers: HeaderMap,
    gate: Extension<Arc<SessionGate>>,
    settings: Extension<Arc<Settings>>,
    Json(request): Json<DeleteRequest>,
) -> Response {
    if let Err(denied) = require_admin(&headers, &gate.0, "/admin/resume").await {
        return denied;
    }

    if !ALLOWED_FILES.contains(&request.filename.as_str()) {
        return bad_upload("Invalid filename");
    }

    let path = files_dir(&settings.0).join(&request.filename);
    match fs::remove_file(&path).await {
        Ok(()) => {
            audit::admin_action(
                &format!("Resume file deleted: {}", request.filename),
                extract_client_ip(&headers).as_deref(),
            );

            Json(json!({
                "success": true,
                "message": format!("{} deleted successfully", request.filename),
            }))
            .into_response()
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "File not found" })),
        )
            .into_response(),
        Err(err) => {
            error!("Delete resume file error: {err}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Delete error" })),
            )
                .into_response()
        }
    }
}

/// Public download of the resume in the requested format.
pub async fn download(
    headers: HeaderMap,
    Path(format): Path<String>,
    settings: Extension<Arc<Settings>>,
) -> Response {
    let (file, download_name, mime) = match format.as_str() {
        "pdf" => ("resume.pdf", "resume.pdf", "application/pdf"),
        "word" => (
            "resume.docx",
            "resume.docx",
            WORD_TYPES[1],
        ),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid resume format requested." })),
            )
                .into_response();
        }
    };

    let path = files_dir(&settings.0).join(file);
    match fs::read(&path).await {
        Ok(bytes) => {
            audit::admin_action(
                &format!("Resume downloaded ({format})"),
                extract_client_ip(&headers).as_deref(),
            );

            (
                [
                    (CONTENT_TYPE, mime.to_string()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{download_name}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Resume is not available." })),
        )
            .into_response(),
    }
}

/// Old bookmark support.
pub async fn download_legacy() -> Redirect {
    Redirect::permanent("/resume/pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::testing::RecordingSender;
    use crate::email::EmailSender;
    use crate::security::credentials::{CredentialManager, RotationPolicy, DEV_SECRET};
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;
    use tempfile::TempDir;

    async fn gate_and_token() -> (Arc<SessionGate>, String) {
        let sender: Arc<dyn EmailSender> = Arc::new(RecordingSender::ok());
        let manager = CredentialManager::initialize(
            RotationPolicy {
                interval_minutes: 30,
                development_mode: true,
            },
            "owner@example.com".to_string(),
            sender,
        )
        .await
        .unwrap();
        let gate = Arc::new(SessionGate::new(manager, 2));
        let token = gate.login(DEV_SECRET, None).await.unwrap();
        (gate, token)
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("vetrina_admin={token}")).unwrap(),
        );
        headers
    }

    fn settings(assets: &std::path::Path) -> Arc<Settings> {
        Arc::new(Settings::new(
            std::path::PathBuf::from("data"),
            assets.to_path_buf(),
        ))
    }

    #[tokio::test]
    async fn list_reports_present_files() {
        let (gate, token) = gate_and_token().await;
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join("files/resume.pdf"), b"%PDF-1.4").unwrap();

        let response = list(
            cookie_headers(&token),
            Extension(gate),
            Extension(settings(dir.path())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["files"].as_array().unwrap().len(), 1);
        assert_eq!(value["files"][0]["name"], "resume.pdf");
    }

    #[tokio::test]
    async fn remove_rejects_unlisted_filenames() {
        let (gate, token) = gate_and_token().await;
        let dir = TempDir::new().unwrap();

        let response = remove(
            cookie_headers(&token),
            Extension(gate),
            Extension(settings(dir.path())),
            Json(DeleteRequest {
                filename: "../app.db".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn remove_deletes_managed_file() {
        let (gate, token) = gate_and_token().await;
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("files")).unwrap();
        let path = dir.path().join("files/resume.docx");
        std::fs::write(&path, b"doc").unwrap();

        let response = remove(
            cookie_headers(&token),
            Extension(gate),
            Extension(settings(dir.path())),
            Json(DeleteRequest {
                filename: "resume.docx".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn download_serves_pdf_as_attachment() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join("files/resume.pdf"), b"%PDF-1.4").unwrap();

        let response = download(
            HeaderMap::new(),
            Path("pdf".to_string()),
            Extension(settings(dir.path())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(disposition.contains("resume.pdf"));
    }

    #[tokio::test]
    async fn download_rejects_unknown_format_and_missing_file() {
        let dir = TempDir::new().unwrap();

        let response = download(
            HeaderMap::new(),
            Path("exe".to_string()),
            Extension(settings(dir.path())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = download(
            HeaderMap::new(),
            Path("pdf".to_string()),
            Extension(settings(dir.path())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_requires_session() {
        let (gate, _) = gate_and_token().await;
        let dir = TempDir::new().unwrap();

        let response = list(HeaderMap::new(), Extension(gate), Extension(settings(dir.path()))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
