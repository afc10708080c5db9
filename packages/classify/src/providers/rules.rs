//! Deterministic rule-based risk scorer.
//!
//! The reference implementation: the category alone fixes a baseline tier
//! and high-severity keywords in the description can only escalate it,
//! never de-escalate. Matching is case-insensitive substring detection,
//! the same approach the ingestion taxonomy uses for source type strings.

use safehaven_incident_models::{IncidentCategory, RiskTier};

use super::{RiskResult, RiskScorer};
use crate::ClassifyError;

/// Keywords that escalate a report to [`RiskTier::High`] regardless of
/// category baseline: weapons, violence, active danger to persons.
const HIGH_SEVERITY_KEYWORDS: &[&str] = &[
    "weapon",
    "gun",
    "firearm",
    "knife",
    "shooting",
    "shots fired",
    "fire",
    "explosion",
    "injury",
    "injured",
    "bleeding",
    "attack",
    "assault",
    "scream",
];

/// Keywords that escalate a report to at least [`RiskTier::Medium`]:
/// hazards and criminal activity below the immediate-danger threshold.
const MEDIUM_SEVERITY_KEYWORDS: &[&str] = &[
    "break-in",
    "breaking in",
    "broke",
    "stolen",
    "theft",
    "prowler",
    "trespass",
    "reckless",
    "speeding",
    "threat",
];

/// Deterministic keyword- and category-driven scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScorer;

impl RuleScorer {
    /// Creates a new rule scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl RiskScorer for RuleScorer {
    async fn score(
        &self,
        category: IncidentCategory,
        text: &str,
        _image: Option<&[u8]>,
    ) -> Result<RiskResult, ClassifyError> {
        Ok(score_rules(category, text))
    }
}

/// Pure scoring function behind [`RuleScorer`].
///
/// Escalation is monotone: a keyword hit raises the result to
/// `max(baseline, keyword tier)`, so adding a keyword to a description can
/// never lower the resulting tier.
#[must_use]
pub fn score_rules(category: IncidentCategory, text: &str) -> RiskResult {
    let baseline = category.baseline_risk();
    let lower = text.to_lowercase();

    let high_hit = HIGH_SEVERITY_KEYWORDS
        .iter()
        .find(|kw| lower.contains(*kw));
    let medium_hit = MEDIUM_SEVERITY_KEYWORDS
        .iter()
        .find(|kw| lower.contains(*kw));

    let (risk, confidence, rationale) = match (high_hit, medium_hit) {
        (Some(kw), _) => {
            let risk = baseline.max(RiskTier::High);
            let confidence = if baseline == RiskTier::High { 0.9 } else { 0.75 };
            (
                risk,
                confidence,
                format!("{category} baseline {baseline}, escalated by keyword \"{kw}\""),
            )
        }
        (None, Some(kw)) => {
            let risk = baseline.max(RiskTier::Medium);
            let confidence = if risk == baseline { 0.75 } else { 0.7 };
            (
                risk,
                confidence,
                format!("{category} baseline {baseline}, keyword \"{kw}\""),
            )
        }
        (None, None) => (
            baseline,
            0.6,
            format!("{category} baseline {baseline}, no escalating keywords"),
        ),
    };

    RiskResult {
        risk,
        confidence,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_baselines_without_keywords() {
        assert_eq!(
            score_rules(IncidentCategory::Crime, "something happened").risk,
            RiskTier::High
        );
        assert_eq!(
            score_rules(IncidentCategory::Traffic, "cars everywhere").risk,
            RiskTier::Medium
        );
        assert_eq!(
            score_rules(IncidentCategory::LostPet, "small brown dog near Oak Ave").risk,
            RiskTier::Low
        );
    }

    #[test]
    fn high_severity_keywords_escalate() {
        assert_eq!(
            score_rules(IncidentCategory::LostPet, "dog ran toward the fire").risk,
            RiskTier::High
        );
        assert_eq!(
            score_rules(IncidentCategory::Suspicious, "man with a weapon").risk,
            RiskTier::High
        );
    }

    #[test]
    fn medium_severity_keywords_escalate_low_baseline_only() {
        assert_eq!(
            score_rules(IncidentCategory::LostPet, "stolen cat carrier left behind").risk,
            RiskTier::Medium
        );
        // Already above medium: keyword cannot lower it.
        assert_eq!(
            score_rules(IncidentCategory::Crime, "someone speeding away").risk,
            RiskTier::High
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            score_rules(IncidentCategory::Other, "SHOTS FIRED on Maple").risk,
            RiskTier::High
        );
    }

    /// Adding any severity keyword to a description never lowers the tier
    /// relative to the same description without it, for every category.
    #[test]
    fn keyword_escalation_is_monotone() {
        let plain = "an ordinary evening on the block";
        for &category in IncidentCategory::all() {
            let base = score_rules(category, plain).risk;
            for kw in HIGH_SEVERITY_KEYWORDS
                .iter()
                .chain(MEDIUM_SEVERITY_KEYWORDS)
            {
                let augmented = format!("{plain} {kw}");
                assert!(
                    score_rules(category, &augmented).risk >= base,
                    "keyword {kw:?} lowered risk for {category}"
                );
            }
        }
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        for &category in IncidentCategory::all() {
            for text in ["", "fire", "stolen bike", "quiet night"] {
                let result = score_rules(category, text);
                assert!((0.0..=1.0).contains(&result.confidence));
            }
        }
    }

    #[test]
    fn scores_realistic_reports() {
        let broke = score_rules(
            IncidentCategory::Crime,
            "Someone broke a car window on Maple Street",
        );
        assert_eq!(broke.risk, RiskTier::High);

        let dog = score_rules(IncidentCategory::LostPet, "small brown dog near Oak Ave");
        assert_eq!(dog.risk, RiskTier::Low);
    }
}
