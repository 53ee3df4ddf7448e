use crate::{
    content::ContentStore,
    email::EmailSender,
    security::SessionGate,
    settings::Settings,
};
use anyhow::Result;
use axum::{
    Extension,
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::PropagateRequestIdLayer,
    services::ServeDir,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

pub mod handlers;

// Resume uploads go through multipart; leave headroom above the 10MB cap.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Shared state handed to every handler through request extensions.
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub gate: Arc<SessionGate>,
    pub store: Arc<ContentStore>,
    pub sender: Arc<dyn EmailSender>,
}

/// Build the application router.
#[must_use]
pub fn router(context: &AppContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    axum::Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/data/:section", get(handlers::pages::section_data))
        .route("/contact", post(handlers::contact::submit))
        .route("/resume/:format", get(handlers::resume::download))
        .route("/download-resume", get(handlers::resume::download_legacy))
        .route("/admin/login", post(handlers::admin::login))
        .route("/admin/logout", post(handlers::admin::logout))
        .route("/admin/session", get(handlers::admin::session_status))
        .route(
            "/admin/content/:section",
            put(handlers::admin::save_content),
        )
        .route("/admin/rotate", post(handlers::admin::rotate_credential))
        .route("/admin/backup", get(handlers::admin::download_backup))
        .route("/admin/restore", post(handlers::admin::restore_backup))
        .route(
            "/admin/resume",
            post(handlers::resume::upload)
                .get(handlers::resume::list)
                .delete(handlers::resume::remove),
        )
        .fallback_service(ServeDir::new(context.settings.assets_dir()))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(context.settings.clone()))
                .layer(Extension(context.gate.clone()))
                .layer(Extension(context.store.clone()))
                .layer(Extension(context.sender.clone())),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    context: AppContext,
    rotation: Option<JoinHandle<()>>,
) -> Result<()> {
    let app = router(&context);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    if let Some(handle) = rotation {
        handle.abort();
    }

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
