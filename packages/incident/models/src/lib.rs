#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident taxonomy types and risk tier definitions.
//!
//! This crate defines the canonical closed set of incident categories, the
//! risk tiers assigned by classification, and the classification lifecycle
//! statuses used across the entire SafeHaven system. Clients submit a
//! category from this enumeration; unrecognized values are rejected at
//! validation, never coerced.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Risk tier assigned to a classified incident, from 1 (low) to 3 (high).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskTier {
    /// Level 1: Low severity (lost pets, minor nuisances)
    Low = 1,
    /// Level 2: Medium severity (traffic hazards, suspicious activity)
    Medium = 2,
    /// Level 3: High severity (crimes, threats to persons)
    High = 3,
}

impl RiskTier {
    /// Returns the numeric value of this risk tier.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a risk tier from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-3.
    pub const fn from_value(value: u8) -> Result<Self, InvalidRiskTierError> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            _ => Err(InvalidRiskTierError { value }),
        }
    }
}

/// Error returned when attempting to create a [`RiskTier`] from an invalid
/// numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRiskTierError {
    /// The invalid risk value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidRiskTierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid risk tier value {}: expected 1-3", self.value)
    }
}

impl std::error::Error for InvalidRiskTierError {}

/// Closed set of incident categories residents can report.
///
/// The wire representation is `snake_case` (`lost_pet`, `crime`, ...).
/// Submissions with a category outside this set fail validation; there is
/// deliberately no catch-all parsing into [`IncidentCategory::Other`], so
/// that client-side typos surface as errors instead of silently degrading
/// classification quality.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentCategory {
    /// Suspicious persons or activity
    Suspicious,
    /// A crime in progress or recently committed
    Crime,
    /// Property damage, graffiti, broken fixtures
    Vandalism,
    /// Traffic hazards, reckless driving, collisions
    Traffic,
    /// Lost or found pets
    LostPet,
    /// Anything not fitting other categories
    Other,
}

impl IncidentCategory {
    /// Returns the baseline risk tier for this category, before any
    /// description-driven escalation.
    #[must_use]
    pub const fn baseline_risk(self) -> RiskTier {
        match self {
            Self::Crime => RiskTier::High,
            Self::Suspicious | Self::Vandalism | Self::Traffic | Self::Other => RiskTier::Medium,
            Self::LostPet => RiskTier::Low,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Suspicious,
            Self::Crime,
            Self::Vandalism,
            Self::Traffic,
            Self::LostPet,
            Self::Other,
        ]
    }
}

/// Classification lifecycle status of an incident.
///
/// Every incident is persisted as [`IncidentStatus::PendingClassification`]
/// before any classification attempt runs, so a submission is durable even
/// when the classifier is slow or unavailable. The only permitted
/// transitions are `PendingClassification -> Classified`,
/// `PendingClassification -> ClassificationFailed`, and
/// `ClassificationFailed -> Classified` (retry).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    /// Persisted, classification not yet attempted or still running.
    PendingClassification,
    /// Classification succeeded; `risk` is present.
    Classified,
    /// Classification attempt failed or timed out; retriable.
    ClassificationFailed,
}

impl IncidentStatus {
    /// Whether an incident in this status may still be (re)classified.
    #[must_use]
    pub const fn is_classifiable(self) -> bool {
        matches!(self, Self::PendingClassification | Self::ClassificationFailed)
    }
}
