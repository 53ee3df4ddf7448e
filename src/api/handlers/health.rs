use crate::settings::Settings;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    content_store: String,
}

// axum handler for health
pub async fn health(method: Method, settings: Extension<Arc<Settings>>) -> impl IntoResponse {
    let data_dir_ok = settings.0.data_dir().is_dir();
    if !data_dir_ok {
        error!(
            "Content data directory is missing: {}",
            settings.0.data_dir().display()
        );
    }

    let health = Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        content_store: if data_dir_ok {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let headers = format!("{}:{}", health.name, health.version)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    (headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    fn settings(data_dir: &std::path::Path) -> Arc<Settings> {
        Arc::new(Settings::new(
            data_dir.to_path_buf(),
            std::path::PathBuf::from("static"),
        ))
    }

    #[tokio::test]
    async fn health_reports_name_and_version() {
        let dir = TempDir::new().unwrap();
        let response = health(Method::GET, Extension(settings(dir.path())))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-App"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: Health = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.name, env!("CARGO_PKG_NAME"));
        assert_eq!(health.content_store, "ok");
    }

    #[tokio::test]
    async fn health_head_requests_have_empty_body() {
        let dir = TempDir::new().unwrap();
        let response = health(Method::HEAD, Extension(settings(dir.path())))
            .await
            .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn health_flags_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let response = health(Method::GET, Extension(settings(&missing)))
            .await
            .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: Health = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.content_store, "error");
    }
}
