//! Remote HTTP scoring provider.
//!
//! Posts the normalized report to a model-backed scoring endpoint and
//! parses the `{risk, confidence, rationale?}` response. The endpoint is
//! any service honoring the scoring contract; SafeHaven does not assume a
//! particular model.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use safehaven_incident_models::{IncidentCategory, RiskTier};
use serde::{Deserialize, Serialize};

use super::{RiskResult, RiskScorer};
use crate::ClassifyError;

/// HTTP scoring provider.
pub struct RemoteScorer {
    url: String,
    client: reqwest::Client,
}

impl RemoteScorer {
    /// Creates a new remote scorer posting to `url`.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRequest<'a> {
    category: IncidentCategory,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_base64: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    risk: String,
    confidence: f64,
    rationale: Option<String>,
}

#[async_trait::async_trait]
impl RiskScorer for RemoteScorer {
    async fn score(
        &self,
        category: IncidentCategory,
        text: &str,
        image: Option<&[u8]>,
    ) -> Result<RiskResult, ClassifyError> {
        let request = ScoreRequest {
            category,
            text,
            image_base64: image.map(|bytes| STANDARD.encode(bytes)),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Provider {
                message: format!("Scoring endpoint returned {status}: {body}"),
            });
        }

        let parsed: ScoreResponse = response.json().await?;

        let risk: RiskTier = parsed
            .risk
            .parse()
            .map_err(|_| ClassifyError::Provider {
                message: format!("Scoring endpoint returned unknown risk tier: {}", parsed.risk),
            })?;

        if !(0.0..=1.0).contains(&parsed.confidence) {
            return Err(ClassifyError::Provider {
                message: format!(
                    "Scoring endpoint returned confidence outside [0,1]: {}",
                    parsed.confidence
                ),
            });
        }

        Ok(RiskResult {
            risk,
            confidence: parsed.confidence,
            rationale: parsed
                .rationale
                .unwrap_or_else(|| "remote model assignment".to_string()),
        })
    }
}
