//! Query functions for the incident store.
//!
//! All access goes through raw parameterized SQL via `switchy_database`,
//! with `moosicbox_json_utils` row decoding. The store is append-only:
//! [`insert_incident`] and [`update_classification`] are the only writes.

use std::fmt::Write as _;

use moosicbox_json_utils::database::ToValue as _;
use safehaven_incident_models::{IncidentCategory, IncidentStatus, RiskTier};
use safehaven_store_models::{FeedFilter, FeedPage, IncidentRow, NewIncident};
use switchy_database::{Database, DatabaseValue};

use crate::cursor::{CursorPayload, decode_cursor, encode_cursor};
use crate::{StoreError, next_created_at_micros};

/// The one permitted mutation of an incident record.
#[derive(Debug, Clone)]
pub enum ClassificationUpdate {
    /// Classification succeeded.
    Classified {
        /// The assigned risk tier.
        risk: RiskTier,
        /// Scorer confidence in `[0, 1]`.
        confidence: f64,
        /// Scorer rationale.
        rationale: String,
    },
    /// Classification failed or timed out; the incident stays retriable.
    Failed,
}

/// Inserts a new incident with server-assigned `id` and `created_at`,
/// returning the stored row in `pending_classification` status.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn insert_incident(
    db: &dyn Database,
    new: &NewIncident,
) -> Result<IncidentRow, StoreError> {
    insert_incident_at(db, new, next_created_at_micros()).await
}

/// Inserts a new incident with an explicit creation timestamp.
///
/// Exists so ordering edge cases (identical `created_at`) are testable;
/// production ingestion always goes through [`insert_incident`].
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn insert_incident_at(
    db: &dyn Database,
    new: &NewIncident,
    created_at_micros: i64,
) -> Result<IncidentRow, StoreError> {
    let status = IncidentStatus::PendingClassification;

    let rows = db
        .query_raw_params(
            "INSERT INTO incidents (
                category, description, photo_ref, photo_mime, location,
                status, created_at_micros
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id",
            &[
                DatabaseValue::String(new.category.to_string()),
                DatabaseValue::String(new.description.clone()),
                new.photo_ref
                    .as_ref()
                    .map_or(DatabaseValue::Null, |r| DatabaseValue::String(r.clone())),
                new.photo_mime
                    .as_ref()
                    .map_or(DatabaseValue::Null, |m| DatabaseValue::String(m.clone())),
                new.location
                    .as_ref()
                    .map_or(DatabaseValue::Null, |l| DatabaseValue::String(l.clone())),
                DatabaseValue::String(status.to_string()),
                DatabaseValue::Int64(created_at_micros),
            ],
        )
        .await
        .map_err(map_db_error)?;

    let id: i64 = rows
        .first()
        .and_then(|row| row.to_value("id").ok())
        .ok_or_else(|| StoreError::Database("INSERT did not return an id".to_string()))?;

    Ok(IncidentRow {
        id,
        category: new.category,
        description: new.description.clone(),
        photo_ref: new.photo_ref.clone(),
        photo_mime: new.photo_mime.clone(),
        location: new.location.clone(),
        risk: None,
        confidence: None,
        rationale: None,
        status,
        created_at: created_at_from_micros(created_at_micros),
        created_at_micros,
    })
}

/// Inserts an incident under a caller-chosen `id`.
///
/// Only restore/import paths use this; normal ingestion lets the store
/// assign ids. An existing `id` is a [`StoreError::Conflict`], never an
/// overwrite.
///
/// # Errors
///
/// Returns [`StoreError::Conflict`] if `id` is already taken, or
/// [`StoreError`] if the database operation fails.
pub async fn insert_incident_with_id(
    db: &dyn Database,
    id: i64,
    new: &NewIncident,
) -> Result<IncidentRow, StoreError> {
    let created_at_micros = next_created_at_micros();
    let status = IncidentStatus::PendingClassification;

    db.exec_raw_params(
        "INSERT INTO incidents (
            id, category, description, photo_ref, photo_mime, location,
            status, created_at_micros
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        &[
            DatabaseValue::Int64(id),
            DatabaseValue::String(new.category.to_string()),
            DatabaseValue::String(new.description.clone()),
            new.photo_ref
                .as_ref()
                .map_or(DatabaseValue::Null, |r| DatabaseValue::String(r.clone())),
            new.photo_mime
                .as_ref()
                .map_or(DatabaseValue::Null, |m| DatabaseValue::String(m.clone())),
            new.location
                .as_ref()
                .map_or(DatabaseValue::Null, |l| DatabaseValue::String(l.clone())),
            DatabaseValue::String(status.to_string()),
            DatabaseValue::Int64(created_at_micros),
        ],
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e.to_string()) {
            StoreError::Conflict { id }
        } else {
            StoreError::Database(e.to_string())
        }
    })?;

    Ok(IncidentRow {
        id,
        category: new.category,
        description: new.description.clone(),
        photo_ref: new.photo_ref.clone(),
        photo_mime: new.photo_mime.clone(),
        location: new.location.clone(),
        risk: None,
        confidence: None,
        rationale: None,
        status,
        created_at: created_at_from_micros(created_at_micros),
        created_at_micros,
    })
}

/// Looks up a single incident by id.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn get_incident(db: &dyn Database, id: i64) -> Result<Option<IncidentRow>, StoreError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM incidents WHERE id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await
        .map_err(map_db_error)?;

    Ok(rows.first().map(row_to_incident))
}

/// Applies the classification transition for `id`.
///
/// Compare-and-set semantics:
/// - `Classified` only applies while the row is still in
///   `pending_classification` or `classification_failed`;
/// - `Failed` only applies while the row is in `pending_classification`.
///
/// Returns `Ok(true)` when the transition was applied and `Ok(false)` when
/// the CAS lost (another writer already classified the incident) — callers
/// drop their result in that case rather than treating it as an error.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if `id` does not exist, or
/// [`StoreError`] if the database operation fails.
pub async fn update_classification(
    db: &dyn Database,
    id: i64,
    update: &ClassificationUpdate,
) -> Result<bool, StoreError> {
    let affected = match update {
        ClassificationUpdate::Classified {
            risk,
            confidence,
            rationale,
        } => {
            db.exec_raw_params(
                "UPDATE incidents
                 SET risk = $1, confidence = $2, rationale = $3, status = $4
                 WHERE id = $5 AND status IN ($6, $7)",
                &[
                    DatabaseValue::Int32(i32::from(risk.value())),
                    DatabaseValue::Real64(*confidence),
                    DatabaseValue::String(rationale.clone()),
                    DatabaseValue::String(IncidentStatus::Classified.to_string()),
                    DatabaseValue::Int64(id),
                    DatabaseValue::String(IncidentStatus::PendingClassification.to_string()),
                    DatabaseValue::String(IncidentStatus::ClassificationFailed.to_string()),
                ],
            )
            .await
        }
        ClassificationUpdate::Failed => {
            db.exec_raw_params(
                "UPDATE incidents
                 SET status = $1
                 WHERE id = $2 AND status = $3",
                &[
                    DatabaseValue::String(IncidentStatus::ClassificationFailed.to_string()),
                    DatabaseValue::Int64(id),
                    DatabaseValue::String(IncidentStatus::PendingClassification.to_string()),
                ],
            )
            .await
        }
    }
    .map_err(map_db_error)?;

    if affected > 0 {
        return Ok(true);
    }

    // Distinguish "CAS lost" from "no such incident".
    if get_incident(db, id).await?.is_some() {
        Ok(false)
    } else {
        Err(StoreError::NotFound { id })
    }
}

/// Returns one feed page ordered by `(created_at DESC, id DESC)`.
///
/// `cursor`, when present, is an opaque token from a previous page and
/// must have been issued under the same `filter`. The returned
/// `next_cursor` is `None` once the feed is exhausted.
///
/// # Errors
///
/// Returns [`StoreError::Cursor`] for malformed or mismatched cursors, or
/// [`StoreError`] if the database operation fails.
pub async fn list_by_recency(
    db: &dyn Database,
    limit: u32,
    cursor: Option<&str>,
    filter: &FeedFilter,
) -> Result<FeedPage, StoreError> {
    let fingerprint = filter.fingerprint();

    let after = cursor
        .map(|token| decode_cursor(token, &fingerprint))
        .transpose()?;

    let mut sql = String::from("SELECT * FROM incidents WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(after) = &after {
        write!(
            sql,
            " AND (created_at_micros < ${} OR (created_at_micros = ${} AND id < ${}))",
            param_idx,
            param_idx + 1,
            param_idx + 2,
        )
        .unwrap();
        params.push(DatabaseValue::Int64(after.created_at_micros));
        params.push(DatabaseValue::Int64(after.created_at_micros));
        params.push(DatabaseValue::Int64(after.id));
        param_idx += 3;
    }

    if let Some(category) = filter.category {
        write!(sql, " AND category = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(category.to_string()));
        param_idx += 1;
    }

    if let Some(risk_min) = filter.risk_min {
        // NULL risk (unclassified rows) never satisfies the comparison,
        // so a tier filter implicitly excludes them.
        write!(sql, " AND risk >= ${param_idx}").unwrap();
        params.push(DatabaseValue::Int32(i32::from(risk_min.value())));
        param_idx += 1;
    }

    sql.push_str(" ORDER BY created_at_micros DESC, id DESC");

    // Fetch one extra row to learn whether another page exists.
    write!(sql, " LIMIT ${param_idx}").unwrap();
    params.push(DatabaseValue::Int64(i64::from(limit) + 1));

    let rows = db.query_raw_params(&sql, &params).await.map_err(map_db_error)?;

    let mut incidents: Vec<IncidentRow> = rows.iter().map(row_to_incident).collect();

    let next_cursor = if incidents.len() > limit as usize {
        incidents.truncate(limit as usize);
        incidents.last().map(|last| {
            encode_cursor(&CursorPayload {
                created_at_micros: last.created_at_micros,
                id: last.id,
                filter: fingerprint.clone(),
            })
        })
    } else {
        None
    };

    Ok(FeedPage {
        incidents,
        next_cursor,
    })
}

/// Returns the declared MIME type recorded for a photo reference.
///
/// `None` when no incident carries the reference.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn photo_mime_for_ref(
    db: &dyn Database,
    reference: &str,
) -> Result<Option<String>, StoreError> {
    let rows = db
        .query_raw_params(
            "SELECT photo_mime FROM incidents WHERE photo_ref = $1 LIMIT 1",
            &[DatabaseValue::String(reference.to_string())],
        )
        .await
        .map_err(map_db_error)?;

    Ok(rows
        .first()
        .and_then(|row| row.to_value("photo_mime").unwrap_or(None)))
}

/// Counts incidents currently awaiting a (re)classification attempt.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn count_unclassified(db: &dyn Database) -> Result<u64, StoreError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) as cnt FROM incidents WHERE status IN ($1, $2)",
            &[
                DatabaseValue::String(IncidentStatus::PendingClassification.to_string()),
                DatabaseValue::String(IncidentStatus::ClassificationFailed.to_string()),
            ],
        )
        .await
        .map_err(map_db_error)?;

    let count: i64 = rows.first().map_or(0, |r| r.to_value("cnt").unwrap_or(0));

    #[allow(clippy::cast_sign_loss)]
    Ok(count as u64)
}

fn map_db_error(e: switchy_database::DatabaseError) -> StoreError {
    StoreError::Database(e.to_string())
}

fn is_unique_violation(message: &str) -> bool {
    message.contains("UNIQUE constraint")
}

fn created_at_from_micros(micros: i64) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

fn row_to_incident(row: &switchy_database::Row) -> IncidentRow {
    let category_name: String = row.to_value("category").unwrap_or_default();
    let category = category_name
        .parse::<IncidentCategory>()
        .unwrap_or(IncidentCategory::Other);

    let status_name: String = row.to_value("status").unwrap_or_default();
    let status = status_name
        .parse::<IncidentStatus>()
        .unwrap_or(IncidentStatus::PendingClassification);

    let risk_val: Option<i32> = row.to_value("risk").unwrap_or(None);
    let risk = risk_val
        .and_then(|v| u8::try_from(v).ok())
        .and_then(|v| RiskTier::from_value(v).ok());

    let created_at_micros: i64 = row.to_value("created_at_micros").unwrap_or(0);

    IncidentRow {
        id: row.to_value("id").unwrap_or(0),
        category,
        description: row.to_value("description").unwrap_or_default(),
        photo_ref: row.to_value("photo_ref").unwrap_or(None),
        photo_mime: row.to_value("photo_mime").unwrap_or(None),
        location: row.to_value("location").unwrap_or(None),
        risk,
        confidence: row.to_value("confidence").unwrap_or(None),
        rationale: row.to_value("rationale").unwrap_or(None),
        status,
        created_at: created_at_from_micros(created_at_micros),
        created_at_micros,
    }
}
