#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the SafeHaven incident service.
//!
//! Serves the REST API for submitting incident reports and reading the
//! classified feed. Reports are durable before classification runs; the
//! risk tier arrives asynchronously and the feed exposes the lifecycle
//! status so clients can render unclassified items distinctly.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safehaven_ingest::{IngestConfig, IngestService, ValidationLimits};
use safehaven_photos::PhotoStore;
use switchy_database::Database;

/// Default directory for content-addressed photo blobs.
const DEFAULT_PHOTO_DIR: &str = "data/photos";

/// Shared application state.
pub struct AppState {
    /// Incident database connection, shared by read paths.
    pub db: Arc<dyn Database>,
    /// Ingestion service; the only writer of the store.
    pub ingest: IngestService,
    /// Content-addressed photo storage.
    pub photos: Arc<PhotoStore>,
}

/// Starts the SafeHaven API server.
///
/// Opens the incident database and photo store, builds the risk scorer
/// from the environment, and starts the Actix-Web HTTP server. This is a
/// regular async function — the caller provides the async runtime (e.g.
/// via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the database, photo store, or scorer cannot be initialized.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let db_path = std::env::var("DATABASE_PATH")
        .map_or_else(|_| PathBuf::from(safehaven_store::DEFAULT_DB_PATH), PathBuf::from);
    log::info!("Opening incident database at {}...", db_path.display());
    let db = safehaven_store::open_db(&db_path)
        .await
        .expect("Failed to open incident database");
    let db: Arc<dyn Database> = Arc::from(db);

    let photo_dir =
        std::env::var("PHOTO_DIR").unwrap_or_else(|_| DEFAULT_PHOTO_DIR.to_string());
    log::info!("Opening photo store at {photo_dir}...");
    let photos =
        Arc::new(PhotoStore::new(photo_dir).expect("Failed to initialize photo store"));

    let scorer = safehaven_classify::scorer_from_env().expect("Failed to configure risk scorer");

    let config = IngestConfig {
        classify_timeout: Duration::from_millis(
            std::env::var("CLASSIFY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        ),
        limits: ValidationLimits {
            max_photo_bytes: std::env::var("MAX_PHOTO_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| ValidationLimits::default().max_photo_bytes),
            ..ValidationLimits::default()
        },
    };

    let ingest = IngestService::new(
        Arc::clone(&db),
        Arc::from(scorer),
        Arc::clone(&photos),
        config,
    );

    let state = web::Data::new(AppState { db, ingest, photos });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5001);

    // Base64 inflates photos by ~4/3; size the JSON limit accordingly.
    let json_limit = config.limits.max_photo_bytes * 2;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(json_limit))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/reports", web::post().to(handlers::submit))
                    .route("/reports/{id}", web::get().to(handlers::report))
                    .route(
                        "/reports/{id}/classify",
                        web::post().to(handlers::retry_classification),
                    )
                    .route("/feed", web::get().to(handlers::feed))
                    .route("/photos/{reference}", web::get().to(handlers::photo)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use safehaven_classify::providers::rules::RuleScorer;
    use safehaven_incident_models::IncidentStatus;
    use safehaven_server_models::{ApiError, FeedResponse, SubmitResponse};

    async fn test_state() -> web::Data<AppState> {
        let db: Arc<dyn Database> =
            Arc::from(safehaven_store::open_in_memory().await.unwrap());
        let photo_dir = std::env::temp_dir().join(format!(
            "safehaven-server-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let photos = Arc::new(PhotoStore::new(photo_dir).unwrap());
        let ingest = IngestService::new(
            Arc::clone(&db),
            Arc::new(RuleScorer::new()),
            Arc::clone(&photos),
            IngestConfig::default(),
        );
        web::Data::new(AppState { db, ingest, photos })
    }

    fn app_config(
        state: web::Data<AppState>,
    ) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg| {
            cfg.app_data(state).service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/reports", web::post().to(handlers::submit))
                    .route("/reports/{id}", web::get().to(handlers::report))
                    .route(
                        "/reports/{id}/classify",
                        web::post().to(handlers::retry_classification),
                    )
                    .route("/feed", web::get().to(handlers::feed)),
            );
        }
    }

    #[actix_web::test]
    async fn health_reports_healthy_with_empty_backlog() {
        let app = test::init_service(App::new().configure(app_config(test_state().await))).await;

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["unclassifiedIncidents"], 0);
    }

    #[actix_web::test]
    async fn submit_then_feed_round_trip() {
        let app = test::init_service(App::new().configure(app_config(test_state().await))).await;

        let request = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(serde_json::json!({
                "category": "crime",
                "description": "Someone broke a car window on Maple Street"
            }))
            .to_request();
        let submitted: SubmitResponse = test::call_and_read_body_json(&app, request).await;
        assert_eq!(submitted.status, IncidentStatus::PendingClassification);

        let feed: FeedResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/feed").to_request(),
        )
        .await;
        assert!(feed.incidents.iter().any(|i| i.id == submitted.id));
    }

    #[actix_web::test]
    async fn invalid_category_is_rejected_with_field() {
        let app = test::init_service(App::new().configure(app_config(test_state().await))).await;

        let request = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(serde_json::json!({
                "category": "weather",
                "description": "hail incoming"
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 400);

        let body: ApiError = test::read_body_json(response).await;
        assert_eq!(body.field.as_deref(), Some("category"));
    }

    #[actix_web::test]
    async fn unknown_report_is_404() {
        let app = test::init_service(App::new().configure(app_config(test_state().await))).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/reports/999").to_request(),
        )
        .await;
        assert_eq!(response.status(), 404);

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/reports/999/classify")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 404);
    }

    #[actix_web::test]
    async fn malformed_cursor_is_rejected() {
        let app = test::init_service(App::new().configure(app_config(test_state().await))).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/feed?cursor=!!!garbage!!!")
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), 400);
    }
}
