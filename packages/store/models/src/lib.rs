#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident store row types and query parameter definitions.
//!
//! These types represent the shapes of data as stored in and retrieved
//! from the `SQLite` database. They are distinct from the API response
//! types in `safehaven_server_models` so the wire contract and the
//! storage schema can evolve independently.

use chrono::{DateTime, Utc};
use safehaven_incident_models::{IncidentCategory, IncidentStatus, RiskTier};
use serde::{Deserialize, Serialize};

/// A validated incident ready for insertion.
///
/// There is deliberately no `id`, `risk`, `status`, or `created_at` here:
/// all of those are assigned server-side. In particular any risk value a
/// client might supply never reaches this type, which is the trust
/// boundary the classifier relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
    /// Incident category from the closed taxonomy.
    pub category: IncidentCategory,
    /// Trimmed, non-empty description.
    pub description: String,
    /// Content-addressed photo reference, if a photo was attached.
    pub photo_ref: Option<String>,
    /// Declared MIME type of the attached photo.
    pub photo_mime: Option<String>,
    /// Free-text location hint.
    pub location: Option<String>,
}

/// An incident row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRow {
    /// Primary key; strictly monotonic, never reused.
    pub id: i64,
    /// Incident category.
    pub category: IncidentCategory,
    /// Description text.
    pub description: String,
    /// Content-addressed photo reference.
    pub photo_ref: Option<String>,
    /// Declared MIME type of the attached photo.
    pub photo_mime: Option<String>,
    /// Free-text location hint.
    pub location: Option<String>,
    /// Assigned risk tier; present iff `status == Classified`.
    pub risk: Option<RiskTier>,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: Option<f64>,
    /// Classifier rationale.
    pub rationale: Option<String>,
    /// Classification lifecycle status.
    pub status: IncidentStatus,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Creation time in microseconds since the Unix epoch; the keyset
    /// pagination key together with `id`.
    pub created_at_micros: i64,
}

/// Filters applied to a feed query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedFilter {
    /// Only include incidents of this category.
    pub category: Option<IncidentCategory>,
    /// Only include classified incidents at or above this tier.
    ///
    /// Unclassified incidents carry no tier and are excluded when this
    /// filter is set.
    pub risk_min: Option<RiskTier>,
}

impl FeedFilter {
    /// A stable fingerprint of the filter, embedded in feed cursors so a
    /// cursor issued under one filter cannot silently page through a
    /// differently-filtered feed.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let category = self
            .category
            .map_or_else(|| "*".to_string(), |c| c.to_string());
        let risk_min = self
            .risk_min
            .map_or_else(|| "*".to_string(), |r| r.to_string());
        format!("{category}/{risk_min}")
    }
}

/// One page of the incident feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    /// Incidents in `(created_at DESC, id DESC)` order.
    pub incidents: Vec<IncidentRow>,
    /// Opaque cursor for the next page; `None` when the feed is exhausted.
    pub next_cursor: Option<String>,
}
