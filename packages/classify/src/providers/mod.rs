//! Risk-scorer abstraction and implementations.
//!
//! A scorer takes the validated category, normalized description text, and
//! optionally the photo bytes, and returns a risk tier with a confidence
//! in `[0, 1]`. Providers must honor this contract and a bounded response
//! time; invocation goes through [`crate::score_bounded`].

pub mod remote;
pub mod rules;

use safehaven_incident_models::{IncidentCategory, RiskTier};
use serde::{Deserialize, Serialize};

use crate::ClassifyError;

/// Outcome of a successful scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    /// The assigned risk tier.
    pub risk: RiskTier,
    /// Scorer confidence in `[0, 1]`.
    pub confidence: f64,
    /// Short human-readable explanation of the assignment.
    pub rationale: String,
}

/// Trait for risk-scoring providers.
#[async_trait::async_trait]
pub trait RiskScorer: Send + Sync {
    /// Scores a validated report.
    ///
    /// `text` is the trimmed description; `image` is the raw photo bytes
    /// when the report included one.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] if the provider cannot produce a result.
    async fn score(
        &self,
        category: IncidentCategory,
        text: &str,
        image: Option<&[u8]>,
    ) -> Result<RiskResult, ClassifyError>;
}

/// Creates a risk scorer based on environment variables.
///
/// If `SCORER_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects: a configured `SCORER_URL` selects the remote HTTP scorer,
/// and the deterministic rule scorer is the fallback.
///
/// # Errors
///
/// Returns [`ClassifyError::Config`] if an explicitly requested provider
/// is not configured or unknown.
pub fn scorer_from_env() -> Result<Box<dyn RiskScorer>, ClassifyError> {
    let provider = std::env::var("SCORER_PROVIDER").unwrap_or_else(|_| {
        if std::env::var("SCORER_URL").is_ok() {
            "remote".to_string()
        } else {
            "rules".to_string()
        }
    });

    match provider.to_lowercase().as_str() {
        "rules" => Ok(Box::new(rules::RuleScorer::new())),
        "remote" => {
            let url = std::env::var("SCORER_URL").map_err(|_| ClassifyError::Config {
                message: "SCORER_URL environment variable not set".to_string(),
            })?;
            Ok(Box::new(remote::RemoteScorer::new(url)))
        }
        other => Err(ClassifyError::Config {
            message: format!("Unknown scorer provider: {other}"),
        }),
    }
}
