//! The ingestion service: the only writer of the incident store.
//!
//! Classification is asynchronous by policy: `submit` acknowledges a
//! report as soon as the pending record is durable, then a spawned task
//! runs the timeout-bounded scorer and applies the result with a
//! compare-and-set. Ingestion latency is therefore bounded by validation
//! plus two local writes, independent of classifier cost or availability.

use std::sync::Arc;
use std::time::Duration;

use safehaven_classify::{ClassifyError, RiskScorer, score_bounded};
use safehaven_incident_models::IncidentCategory;
use safehaven_photos::PhotoStore;
use safehaven_store::queries::{self, ClassificationUpdate};
use safehaven_store::StoreError;
use safehaven_store_models::{IncidentRow, NewIncident};
use switchy_database::Database;

use crate::validate::{RawReport, ValidationLimits, validate};
use crate::IngestError;

/// Ingestion configuration.
#[derive(Debug, Clone, Copy)]
pub struct IngestConfig {
    /// Hard bound on a single scorer invocation.
    pub classify_timeout: Duration,
    /// Validation bounds.
    pub limits: ValidationLimits,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            classify_timeout: Duration::from_secs(10),
            limits: ValidationLimits::default(),
        }
    }
}

/// Orchestrates validate → persist → classify for incoming reports.
#[derive(Clone)]
pub struct IngestService {
    db: Arc<dyn Database>,
    scorer: Arc<dyn RiskScorer>,
    photos: Arc<PhotoStore>,
    config: IngestConfig,
}

impl IngestService {
    /// Creates a new ingestion service.
    #[must_use]
    pub fn new(
        db: Arc<dyn Database>,
        scorer: Arc<dyn RiskScorer>,
        photos: Arc<PhotoStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            db,
            scorer,
            photos,
            config,
        }
    }

    /// Returns the store handle shared with read paths.
    #[must_use]
    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Accepts a raw report: validates, persists it as
    /// `pending_classification`, and schedules classification.
    ///
    /// Returns the durable pending record immediately; the risk tier
    /// arrives later via the background task. Validation failures are
    /// rejected before anything is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on validation failure or if persisting the
    /// report (or its photo) fails.
    pub async fn submit(&self, raw: RawReport) -> Result<IncidentRow, IngestError> {
        let valid = validate(raw, &self.config.limits)?;

        let (photo_ref, photo_mime, image) = match valid.photo {
            Some(photo) => {
                let reference = self.photos.put(&photo.bytes).await?;
                (Some(reference), Some(photo.mime_type), Some(photo.bytes))
            }
            None => (None, None, None),
        };

        let new = NewIncident {
            category: valid.category,
            description: valid.description,
            photo_ref,
            photo_mime,
            location: valid.location,
        };

        let row = queries::insert_incident(self.db.as_ref(), &new).await?;
        log::info!(
            "Accepted incident {} ({}), scheduling classification",
            row.id,
            row.category
        );

        // Scheduled only after the insert completed, so the classification
        // update can never race ahead of its own record.
        let service = self.clone();
        let category = row.category;
        let description = row.description.clone();
        let id = row.id;
        tokio::spawn(async move {
            service
                .classify_and_record(id, category, &description, image.as_deref())
                .await;
        });

        Ok(row)
    }

    /// Re-attempts classification for an incident, on demand.
    ///
    /// Idempotent: an already-classified incident is returned unchanged.
    /// Pending or failed incidents are re-scored inline so the caller
    /// observes the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] wrapping [`StoreError::NotFound`] for an
    /// unknown id, or another store/photo error.
    pub async fn retry_classification(&self, id: i64) -> Result<IncidentRow, IngestError> {
        let row = queries::get_incident(self.db.as_ref(), id)
            .await?
            .ok_or(StoreError::NotFound { id })?;

        if !row.status.is_classifiable() {
            return Ok(row);
        }

        let image = match &row.photo_ref {
            Some(reference) => self.photos.get(reference).await?,
            None => None,
        };

        self.classify_and_record(id, row.category, &row.description, image.as_deref())
            .await;

        let updated = queries::get_incident(self.db.as_ref(), id)
            .await?
            .ok_or(StoreError::NotFound { id })?;
        Ok(updated)
    }

    /// Runs the bounded scorer for one incident and records the outcome.
    ///
    /// Never returns an error: a scorer failure marks the incident
    /// `classification_failed` (retriable), and a lost compare-and-set
    /// means another attempt already won — both are logged and dropped.
    async fn classify_and_record(
        &self,
        id: i64,
        category: IncidentCategory,
        description: &str,
        image: Option<&[u8]>,
    ) {
        let outcome = score_bounded(
            self.scorer.as_ref(),
            category,
            description,
            image,
            self.config.classify_timeout,
        )
        .await;

        let update = match outcome {
            Ok(result) => {
                log::info!(
                    "Classified incident {id} as {} (confidence {:.2})",
                    result.risk,
                    result.confidence
                );
                ClassificationUpdate::Classified {
                    risk: result.risk,
                    confidence: result.confidence,
                    rationale: result.rationale,
                }
            }
            Err(ClassifyError::Timeout { timeout }) => {
                log::warn!("Classification of incident {id} timed out after {timeout:?}");
                ClassificationUpdate::Failed
            }
            Err(e) => {
                log::warn!("Classification of incident {id} failed: {e}");
                ClassificationUpdate::Failed
            }
        };

        match queries::update_classification(self.db.as_ref(), id, &update).await {
            Ok(true) => {}
            Ok(false) => match update {
                ClassificationUpdate::Classified { .. } => {
                    log::debug!("Incident {id} already classified, dropping duplicate result");
                }
                ClassificationUpdate::Failed => {
                    log::debug!(
                        "Incident {id} no longer pending (classified or already marked failed), dropping stale failure"
                    );
                }
            },
            Err(e) => {
                log::error!("Failed to record classification for incident {id}: {e}");
            }
        }
    }
}
