//! HTTP handler functions for the SafeHaven API.

use actix_web::{HttpResponse, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use safehaven_incident_models::{IncidentCategory, RiskTier};
use safehaven_ingest::{IngestError, RawPhoto, RawReport};
use safehaven_server_models::{
    ApiError, ApiHealth, ApiIncident, ApiIncidentDetail, FeedQueryParams, FeedResponse,
    SubmitRequest, SubmitResponse,
};
use safehaven_store::StoreError;
use safehaven_store::queries;
use safehaven_store_models::FeedFilter;

use crate::AppState;

/// Default feed page size.
const DEFAULT_FEED_LIMIT: u32 = 20;

/// Maximum feed page size; larger requests are clamped, not rejected.
const MAX_FEED_LIMIT: u32 = 100;

/// `GET /api/health`
///
/// Liveness plus the classification backlog, so operators can spot a
/// stalled scorer from the health probe alone.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match queries::count_unclassified(state.db.as_ref()).await {
        Ok(unclassified) => HttpResponse::Ok().json(ApiHealth {
            healthy: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            unclassified_incidents: unclassified,
        }),
        Err(e) => {
            log::error!("Health check failed to query the store: {e}");
            internal_error()
        }
    }
}

/// `POST /api/reports`
///
/// Accepts a report submission, persists it as `pending_classification`,
/// and schedules classification. Responds 202 with the tracking id.
pub async fn submit(state: web::Data<AppState>, body: web::Json<SubmitRequest>) -> HttpResponse {
    let request = body.into_inner();

    let photo = match request.photo {
        None => None,
        Some(photo) => match STANDARD.decode(&photo.data_base64) {
            Ok(bytes) => Some(RawPhoto {
                mime_type: photo.mime_type,
                bytes,
            }),
            Err(_) => {
                return HttpResponse::BadRequest().json(ApiError {
                    error: "photo is not valid base64".to_string(),
                    field: Some("photo".to_string()),
                });
            }
        },
    };

    let raw = RawReport {
        category: request.category,
        description: request.description,
        location: request.location,
        photo,
    };

    match state.ingest.submit(raw).await {
        Ok(row) => HttpResponse::Accepted().json(SubmitResponse {
            id: row.id,
            status: row.status,
        }),
        Err(IngestError::Validation(e)) => HttpResponse::BadRequest().json(ApiError {
            error: e.to_string(),
            field: Some(e.field.to_string()),
        }),
        Err(e) => {
            log::error!("Failed to ingest report: {e}");
            internal_error()
        }
    }
}

/// `GET /api/reports/{id}`
///
/// Returns a single incident with classifier rationale, for submission
/// tracking.
pub async fn report(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();

    match queries::get_incident(state.db.as_ref(), id).await {
        Ok(Some(row)) => HttpResponse::Ok().json(ApiIncidentDetail::from(row)),
        Ok(None) => not_found(),
        Err(e) => {
            log::error!("Failed to load incident {id}: {e}");
            internal_error()
        }
    }
}

/// `POST /api/reports/{id}/classify`
///
/// Re-attempts classification for a pending or failed incident. A no-op
/// for incidents already classified.
pub async fn retry_classification(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> HttpResponse {
    let id = path.into_inner();

    match state.ingest.retry_classification(id).await {
        Ok(row) => HttpResponse::Ok().json(ApiIncidentDetail::from(row)),
        Err(IngestError::Store(StoreError::NotFound { .. })) => not_found(),
        Err(e) => {
            log::error!("Failed to retry classification for incident {id}: {e}");
            internal_error()
        }
    }
}

/// `GET /api/feed`
///
/// Returns an ordered page of incidents with optional category and
/// minimum-risk filters, plus an opaque cursor for the next page.
pub async fn feed(state: web::Data<AppState>, params: web::Query<FeedQueryParams>) -> HttpResponse {
    let category = match params.category.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<IncidentCategory>() {
            Ok(category) => Some(category),
            Err(_) => {
                return HttpResponse::BadRequest().json(ApiError {
                    error: format!("unrecognized category: {raw}"),
                    field: Some("category".to_string()),
                });
            }
        },
    };

    let risk_min = match params.risk_min.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<RiskTier>() {
            Ok(tier) => Some(tier),
            Err(_) => {
                return HttpResponse::BadRequest().json(ApiError {
                    error: format!("unrecognized risk tier: {raw}"),
                    field: Some("riskMin".to_string()),
                });
            }
        },
    };

    let filter = FeedFilter { category, risk_min };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);

    match queries::list_by_recency(state.db.as_ref(), limit, params.cursor.as_deref(), &filter)
        .await
    {
        Ok(page) => HttpResponse::Ok().json(FeedResponse {
            incidents: page.incidents.into_iter().map(ApiIncident::from).collect(),
            next_cursor: page.next_cursor,
        }),
        Err(StoreError::Cursor(e)) => HttpResponse::BadRequest().json(ApiError {
            error: e.to_string(),
            field: Some("cursor".to_string()),
        }),
        Err(e) => {
            log::error!("Failed to query feed: {e}");
            internal_error()
        }
    }
}

/// `GET /api/photos/{reference}`
///
/// Serves stored photo bytes under their content-addressed reference,
/// with the MIME type declared at submission.
pub async fn photo(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let reference = path.into_inner();

    let bytes = match state.photos.get(&reference).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return not_found(),
        Err(safehaven_photos::PhotoError::InvalidReference { .. }) => {
            return HttpResponse::BadRequest().json(ApiError {
                error: "invalid photo reference".to_string(),
                field: Some("reference".to_string()),
            });
        }
        Err(e) => {
            log::error!("Failed to load photo {reference}: {e}");
            return internal_error();
        }
    };

    let mime = match queries::photo_mime_for_ref(state.db.as_ref(), &reference).await {
        Ok(mime) => mime.unwrap_or_else(|| "application/octet-stream".to_string()),
        Err(e) => {
            log::error!("Failed to look up MIME for photo {reference}: {e}");
            return internal_error();
        }
    };

    HttpResponse::Ok().content_type(mime).body(bytes)
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Not found"
    }))
}

/// Internal failures surface as a generic message; details stay in logs.
fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "Internal server error"
    }))
}
