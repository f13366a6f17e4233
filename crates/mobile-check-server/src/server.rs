//! HTTP server for uploading checklists and serving them back.
//!
//! Routes:
//! - `POST /api/upload` stores a checklist and returns a link to it
//! - `GET /api/mobile-check?id=` renders the checklist page
//! - `GET /api/getData?id=` returns the stored JSON once and deletes it
//! - `POST /api/storeData` stores any JSON document
//! - everything else is served from the public directory

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use mobile_check_core::{Error, ErrorKind, Result};
use mobile_check_store::{open_store, PayloadStore, StoreConfig};
use mobile_check_telemetry::RequestMetrics;

use crate::api::{ErrorBody, ServerStatus};
use crate::handlers;

/// Default recipient of checklist reports.
pub const DEFAULT_REPORT_EMAIL: &str = "support@2020glass.com";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable CORS.
    pub cors: bool,
    /// Directory served for `/` and unmatched paths.
    pub public_dir: PathBuf,
    /// Base URL used in upload links. Derived from the request when unset.
    pub public_url: Option<String>,
    /// Recipient of the report drafted by the checklist page.
    pub report_email: String,
    /// Reject multipart uploads that carry no `file` part.
    pub require_upload_file: bool,
    /// Delete an entry the first time its page is rendered.
    pub consume_on_view: bool,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            cors: true,
            public_dir: PathBuf::from("public"),
            public_url: None,
            report_email: DEFAULT_REPORT_EMAIL.to_string(),
            require_upload_file: false,
            consume_on_view: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Creates a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    cors: Option<bool>,
    public_dir: Option<PathBuf>,
    public_url: Option<String>,
    report_email: Option<String>,
    require_upload_file: Option<bool>,
    consume_on_view: Option<bool>,
    max_body_bytes: Option<usize>,
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets whether CORS is enabled.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    /// Sets the static file directory.
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }

    /// Sets the base URL for upload links.
    pub fn public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// Sets the report recipient.
    pub fn report_email(mut self, email: impl Into<String>) -> Self {
        self.report_email = Some(email.into());
        self
    }

    /// Sets whether multipart uploads must carry a file.
    pub fn require_upload_file(mut self, required: bool) -> Self {
        self.require_upload_file = Some(required);
        self
    }

    /// Sets whether rendering a page deletes its entry.
    pub fn consume_on_view(mut self, consume: bool) -> Self {
        self.consume_on_view = Some(consume);
        self
    }

    /// Sets the maximum request body size.
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = Some(max);
        self
    }

    /// Builds the server config.
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            addr: self.addr.unwrap_or(defaults.addr),
            cors: self.cors.unwrap_or(defaults.cors),
            public_dir: self.public_dir.unwrap_or(defaults.public_dir),
            public_url: self
                .public_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            report_email: self.report_email.unwrap_or(defaults.report_email),
            require_upload_file: self
                .require_upload_file
                .unwrap_or(defaults.require_upload_file),
            consume_on_view: self.consume_on_view.unwrap_or(defaults.consume_on_view),
            max_body_bytes: self.max_body_bytes.unwrap_or(defaults.max_body_bytes),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Where payloads live.
    pub store: Arc<dyn PayloadStore>,
    /// Server configuration.
    pub config: ServerConfig,
    /// Request counters.
    pub metrics: RequestMetrics,
    /// Server start time.
    pub start_time: Instant,
}

impl AppState {
    /// Creates new app state around a store.
    pub fn new(config: ServerConfig, store: Arc<dyn PayloadStore>) -> Self {
        Self {
            store,
            config,
            metrics: RequestMetrics::new(),
            start_time: Instant::now(),
        }
    }
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a new server backed by the given store.
    pub fn new(config: ServerConfig, store: Arc<dyn PayloadStore>) -> Self {
        let state = Arc::new(AppState::new(config.clone(), store));
        Self { config, state }
    }

    /// Creates a new server, opening the store described by `store_config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub async fn with_store_config(config: ServerConfig, store_config: &StoreConfig) -> Result<Self> {
        let store = open_store(store_config).await?;
        Ok(Self::new(config, store))
    }

    /// Returns the shared state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot start.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        tracing::info!(
            addr = %self.config.addr,
            store = self.state.store.backend_name(),
            public_dir = %self.config.public_dir.display(),
            "Starting Mobile Check server"
        );
        eprintln!(
            "\n\x1b[32m✓\x1b[0m Server listening on http://{}",
            self.config.addr
        );
        eprintln!("  Press Ctrl+C to stop\n");

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(Error::Io)?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        eprintln!("\x1b[32m✓\x1b[0m Server stopped");

        Ok(())
    }
}

/// Builds the router around existing state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/api/status", get(server_status))
        // Checklist endpoints
        .route("/api/upload", post(handlers::upload))
        .route("/api/mobile-check", get(handlers::mobile_check))
        .route(
            "/api/getData",
            // `get` also answers HEAD, which would consume the entry.
            get(handlers::get_data)
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/storeData",
            post(handlers::store_data).fallback(handlers::method_not_allowed),
        )
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(Arc::clone(&state));

    router = router.layer(TraceLayer::new_for_http());

    if config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received SIGTERM, shutting down gracefully...");
        },
    }
}

// === Error Response ===

/// How an error body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorFormat {
    /// `{"error": "..."}`
    Json,
    /// Plain text.
    Text,
}

/// Converts a request failure into a response, logging and counting it.
///
/// Internal failures never expose their detail to the caller.
pub(crate) fn error_response(state: &AppState, err: &Error, format: ErrorFormat) -> Response {
    let (status, message) = match err.kind() {
        ErrorKind::BadMethod => {
            tracing::debug!(error = %err, "Rejected request method");
            (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
        },
        ErrorKind::MissingInput => {
            tracing::warn!(error = %err, "Rejected request input");
            (StatusCode::BAD_REQUEST, err.to_string())
        },
        ErrorKind::NotFound => {
            state.metrics.record_not_found();
            tracing::debug!(error = %err, "Lookup missed");
            (StatusCode::NOT_FOUND, "Data not found".to_string())
        },
        ErrorKind::Internal => {
            state.metrics.record_error();
            tracing::error!(error = %err, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        },
    };

    match format {
        ErrorFormat::Json => (status, Json(ErrorBody::new(message))).into_response(),
        ErrorFormat::Text => (status, message).into_response(),
    }
}

// === Health Endpoints ===

async fn health() -> &'static str {
    "OK"
}

async fn server_status(State(state): State<Arc<AppState>>) -> Response {
    let stored_entries = match state.store.count().await {
        Ok(count) => count,
        Err(e) => return error_response(&state, &e, ErrorFormat::Json),
    };

    Json(ServerStatus {
        status: "running".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store_backend: state.store.backend_name().to_string(),
        stored_entries,
        metrics: state.metrics.snapshot(),
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mobile_check_store::InMemoryStore;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::builder()
            .addr("127.0.0.1:8080".parse().unwrap())
            .cors(false)
            .public_dir("site")
            .public_url("https://checks.example.com/")
            .report_email("qa@example.com")
            .require_upload_file(true)
            .consume_on_view(true)
            .max_body_bytes(1024)
            .build();

        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert!(!config.cors);
        assert_eq!(config.public_dir, PathBuf::from("site"));
        assert_eq!(
            config.public_url,
            Some("https://checks.example.com".to_string())
        );
        assert_eq!(config.report_email, "qa@example.com");
        assert!(config.require_upload_file);
        assert!(config.consume_on_view);
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::builder().public_url("").build();
        assert_eq!(config.addr.port(), 3000);
        assert!(config.cors);
        assert_eq!(config.public_url, None);
        assert_eq!(config.report_email, DEFAULT_REPORT_EMAIL);
        assert!(!config.require_upload_file);
        assert!(!config.consume_on_view);
    }

    #[test]
    fn test_error_response_statuses() {
        let state = AppState::new(ServerConfig::default(), Arc::new(InMemoryStore::new()));

        let cases = [
            (
                Error::MethodNotAllowed {
                    method: "PUT".into(),
                },
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (Error::missing("data"), StatusCode::BAD_REQUEST),
            (Error::invalid_payload("bad"), StatusCode::BAD_REQUEST),
            (Error::not_found("x"), StatusCode::NOT_FOUND),
            (Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(&state, &err, ErrorFormat::Json).status(), status);
        }

        let snapshot = state.metrics.snapshot();
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.errors, 1);
    }

    #[tokio::test]
    async fn test_health_and_status() {
        let server = Server::new(ServerConfig::default(), Arc::new(InMemoryStore::new()));
        server.state().store.put(serde_json::json!([])).await.unwrap();

        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = server
            .router()
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status["status"], "running");
        assert_eq!(status["store_backend"], "memory");
        assert_eq!(status["stored_entries"], 1);
    }

    #[tokio::test]
    async fn test_static_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Upload</h1>").unwrap();

        let config = ServerConfig::builder().public_dir(dir.path()).build();
        let server = Server::new(config, Arc::new(InMemoryStore::new()));

        let response = server
            .router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Upload</h1>");

        let response = server
            .router()
            .oneshot(Request::get("/missing.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_with_store_config() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::with_store_config(
            ServerConfig::default(),
            &StoreConfig::file(dir.path().join("entries")),
        )
        .await
        .unwrap();
        assert_eq!(server.state().store.backend_name(), "file");
    }
}
