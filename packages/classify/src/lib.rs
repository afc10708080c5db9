#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk classification for incident reports.
//!
//! The classifier is a capability, not a fixed algorithm: the ingestion
//! service depends on the [`RiskScorer`] trait and any concrete provider
//! can be plugged in. Two providers ship here: a deterministic rule-based
//! scorer (category baseline plus keyword escalation) and a remote HTTP
//! scorer for model-backed deployments. Provider selection follows the
//! `SCORER_PROVIDER` / `SCORER_URL` environment variables.
//!
//! Every scorer invocation must be bounded; [`score_bounded`] wraps a call
//! in a timeout so a hung provider can never leave an incident pending
//! forever.

pub mod providers;

use std::time::Duration;

use safehaven_incident_models::IncidentCategory;
use thiserror::Error;

pub use providers::{RiskResult, RiskScorer, scorer_from_env};

/// Errors that can occur during risk classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// HTTP request to the scoring provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned a response that doesn't honor the scoring contract.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The scorer did not respond within the configured bound.
    #[error("Classification timed out after {timeout:?}")]
    Timeout {
        /// The configured timeout.
        timeout: Duration,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Runs a scorer with a hard timeout.
///
/// # Errors
///
/// Returns [`ClassifyError::Timeout`] if the scorer does not complete
/// within `timeout`, or the scorer's own error otherwise.
pub async fn score_bounded(
    scorer: &dyn RiskScorer,
    category: IncidentCategory,
    text: &str,
    image: Option<&[u8]>,
    timeout: Duration,
) -> Result<RiskResult, ClassifyError> {
    match tokio::time::timeout(timeout, scorer.score(category, text, image)).await {
        Ok(result) => result,
        Err(_) => Err(ClassifyError::Timeout { timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safehaven_incident_models::RiskTier;

    struct StalledScorer;

    #[async_trait::async_trait]
    impl RiskScorer for StalledScorer {
        async fn score(
            &self,
            _category: IncidentCategory,
            _text: &str,
            _image: Option<&[u8]>,
        ) -> Result<RiskResult, ClassifyError> {
            // Never completes within any test timeout.
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_scorer_times_out() {
        let result = score_bounded(
            &StalledScorer,
            IncidentCategory::Crime,
            "anything",
            None,
            Duration::from_millis(50),
        )
        .await;

        assert!(matches!(result, Err(ClassifyError::Timeout { .. })));
    }

    #[tokio::test]
    async fn fast_scorer_passes_through() {
        let scorer = providers::rules::RuleScorer::new();
        let result = score_bounded(
            &scorer,
            IncidentCategory::LostPet,
            "small brown dog near Oak Ave",
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.risk, RiskTier::Low);
    }
}
