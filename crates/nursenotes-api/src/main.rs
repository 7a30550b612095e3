//! nursenotes-api - HTTP API server for nursenotes

mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use nursenotes_core::defaults::MAX_UPLOAD_BYTES;
use nursenotes_core::{AuthEvent, NoteRepository, NoteUploader, ObjectStore, SessionStore};
use nursenotes_db::{Database, FilesystemStore, PgNoteRepository};

use handlers::{auth, contact, notes, profiles};
use state::AppState;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically, which keeps
/// log correlation cheap when debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Parse allowed origins from the comma-separated `ALLOWED_ORIGINS` variable.
///
/// Strict origin whitelisting; defaults cover local frontend development.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = trimmed, "Ignoring unparseable allowed origin");
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// LOGGING
// =============================================================================

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "nursenotes_api=debug,tower_http=debug")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nursenotes_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("nursenotes-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = init_tracing();

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/nursenotes".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let file_storage_path = std::env::var("FILE_STORAGE_PATH")
        .unwrap_or_else(|_| "/var/lib/nursenotes/files".to_string());
    let public_base_url = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("http://localhost:{}/files", port));

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize file storage and verify it actually works before serving
    let store = Arc::new(FilesystemStore::new(&file_storage_path, &public_base_url));
    store
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("File storage validation failed: {}", e))?;
    info!("File storage initialized at {}", file_storage_path);

    // Upload runner over the store and note repository
    let uploader = Arc::new(NoteUploader::new(
        store.clone() as Arc<dyn ObjectStore>,
        Arc::new(PgNoteRepository::new(db.pool.clone())) as Arc<dyn NoteRepository>,
    ));

    // Process-wide auth event store; one subscriber logs the event stream.
    let sessions = Arc::new(SessionStore::new(64));
    {
        let mut events = sessions.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedIn(user)) => {
                        info!(subsystem = "auth", component = "session", user_id = %user.id, "signed in");
                    }
                    Ok(AuthEvent::SignedOut) => {
                        info!(subsystem = "auth", component = "session", "signed out");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(subsystem = "auth", component = "session", missed, "auth event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    let app_state = AppState {
        db,
        store,
        uploader,
        sessions,
    };

    // CORS: strict origin allowlist
    let cors = CorsLayer::new()
        .allow_origin(parse_allowed_origins())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    // Uploads are capped at 50 MiB; leave headroom for the multipart framing.
    let body_limit = (MAX_UPLOAD_BYTES + 2 * 1024 * 1024) as usize;

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/api/notes", get(notes::list_notes).post(notes::upload_note))
        .route("/api/notes/featured", get(notes::featured_notes))
        .route("/api/notes/mine", get(notes::my_notes))
        .route("/api/notes/:id", delete(notes::delete_note))
        .route(
            "/api/profiles/me",
            get(profiles::my_profile).put(profiles::update_my_profile),
        )
        .route("/api/profiles/search", get(profiles::search_profiles))
        .route("/api/profiles/directory", get(profiles::profile_directory))
        .route("/api/profiles/:id", get(profiles::public_profile))
        .route("/api/contact", post(contact::submit_contact))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid HOST/PORT: {}", e))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Liveness probe.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
