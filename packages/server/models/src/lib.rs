#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the SafeHaven server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store row types to allow independent evolution of the API
//! contract. Note there is no risk field anywhere on the submission types:
//! risk is assigned server-side only, so a client cannot even express one.

use chrono::{DateTime, Utc};
use safehaven_incident_models::{IncidentCategory, IncidentStatus, RiskTier};
use safehaven_store_models::IncidentRow;
use serde::{Deserialize, Serialize};

/// An incident report submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Claimed category; validated against the closed taxonomy.
    pub category: String,
    /// Free-text description.
    pub description: String,
    /// Optional free-text location hint.
    pub location: Option<String>,
    /// Optional attached photo.
    pub photo: Option<SubmitPhoto>,
}

/// A photo attached to a submission.
///
/// The camera widget and file upload both produce this shape: declared
/// MIME type plus base64 bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPhoto {
    /// Declared MIME type.
    pub mime_type: String,
    /// Standard base64 of the image bytes.
    pub data_base64: String,
}

/// Acknowledgment of an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Tracking identifier for the new incident.
    pub id: i64,
    /// Initial status, always `pending_classification`.
    pub status: IncidentStatus,
}

/// An incident as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Unique incident ID.
    pub id: i64,
    /// Incident category.
    pub category: IncidentCategory,
    /// Description text.
    pub description: String,
    /// Content-addressed photo reference, servable via `/api/photos/{ref}`.
    pub photo_ref: Option<String>,
    /// Free-text location hint.
    pub location: Option<String>,
    /// Assigned risk tier; absent while unclassified.
    pub risk: Option<RiskTier>,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: Option<f64>,
    /// Classification lifecycle status, so clients can render
    /// "analyzing…" distinctly from a confirmed risk badge.
    pub status: IncidentStatus,
    /// When the report was accepted (ISO 8601).
    pub created_at: DateTime<Utc>,
}

impl From<IncidentRow> for ApiIncident {
    fn from(row: IncidentRow) -> Self {
        Self {
            id: row.id,
            category: row.category,
            description: row.description,
            photo_ref: row.photo_ref,
            location: row.location,
            risk: row.risk,
            confidence: row.confidence,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

/// An incident with classifier rationale, returned by the per-report
/// lookup endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncidentDetail {
    /// The incident.
    #[serde(flatten)]
    pub incident: ApiIncident,
    /// Classifier rationale, when classified.
    pub rationale: Option<String>,
}

impl From<IncidentRow> for ApiIncidentDetail {
    fn from(row: IncidentRow) -> Self {
        let rationale = row.rationale.clone();
        Self {
            incident: ApiIncident::from(row),
            rationale,
        }
    }
}

/// Query parameters for the feed endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    /// Maximum number of results (clamped server-side).
    pub limit: Option<u32>,
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Only include incidents of this category.
    pub category: Option<String>,
    /// Only include classified incidents at or above this tier.
    pub risk_min: Option<String>,
}

/// Response from the feed endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Page of incidents, most recent first.
    pub incidents: Vec<ApiIncident>,
    /// Cursor for the next page; absent when the feed is exhausted.
    pub next_cursor: Option<String>,
}

/// Error payload returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
    /// The offending field, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Incidents still awaiting a (re)classification attempt; a growing
    /// number signals a stalled or failing scorer.
    pub unclassified_incidents: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_ignores_client_supplied_risk() {
        // Unknown fields (a client trying to set risk) are simply dropped.
        let request: SubmitRequest = serde_json::from_str(
            r#"{"category": "crime", "description": "broken window", "risk": "low"}"#,
        )
        .unwrap();
        assert_eq!(request.category, "crime");
    }

    #[test]
    fn api_incident_serializes_camel_case() {
        let row = IncidentRow {
            id: 3,
            category: IncidentCategory::LostPet,
            description: "small brown dog".to_string(),
            photo_ref: None,
            photo_mime: None,
            location: None,
            risk: Some(RiskTier::Low),
            confidence: Some(0.6),
            rationale: Some("baseline".to_string()),
            status: IncidentStatus::Classified,
            created_at: DateTime::from_timestamp_micros(1_700_000_000_000_000).unwrap(),
            created_at_micros: 1_700_000_000_000_000,
        };

        let json = serde_json::to_value(ApiIncident::from(row.clone())).unwrap();
        assert_eq!(json["category"], "lost_pet");
        assert_eq!(json["risk"], "low");
        assert_eq!(json["status"], "classified");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");

        let detail = serde_json::to_value(ApiIncidentDetail::from(row)).unwrap();
        assert_eq!(detail["rationale"], "baseline");
        assert_eq!(detail["id"], 3);
    }

    #[test]
    fn pending_incident_exposes_status_without_risk() {
        let row = IncidentRow {
            id: 9,
            category: IncidentCategory::Suspicious,
            description: "prowler".to_string(),
            photo_ref: None,
            photo_mime: None,
            location: None,
            risk: None,
            confidence: None,
            rationale: None,
            status: IncidentStatus::PendingClassification,
            created_at: DateTime::from_timestamp_micros(0).unwrap(),
            created_at_micros: 0,
        };

        let json = serde_json::to_value(ApiIncident::from(row)).unwrap();
        assert_eq!(json["status"], "pending_classification");
        assert!(json["risk"].is_null());
    }
}
