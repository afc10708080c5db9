//! Report validation.
//!
//! Pure, fail-fast normalization of untrusted submissions. The first
//! failing rule wins so client feedback stays simple: one field, one
//! reason. Unrecognized categories are rejected rather than coerced to
//! `other` — silent coercion would hide client bugs.

use safehaven_incident_models::IncidentCategory;
use thiserror::Error;

/// Image MIME types accepted for report photos.
pub const ACCEPTED_IMAGE_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// A report submission rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    /// The first field that failed validation.
    pub field: &'static str,
    /// Why it failed.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Configured validation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    /// Maximum description length in characters, after trimming.
    pub max_description_chars: usize,
    /// Maximum accepted photo size in bytes.
    pub max_photo_bytes: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_description_chars: 2_000,
            max_photo_bytes: 5 * 1024 * 1024,
        }
    }
}

/// An attached photo as submitted, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPhoto {
    /// Client-declared MIME type.
    pub mime_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// An untrusted, partially-structured report as received from a client.
///
/// There is no risk field: any risk value a client sends is dropped at
/// the API edge before this type is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    /// Claimed category string.
    pub category: String,
    /// Free-text description.
    pub description: String,
    /// Optional free-text location hint.
    pub location: Option<String>,
    /// Optional attached photo.
    pub photo: Option<RawPhoto>,
}

/// A report that passed all validation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReport {
    /// Parsed category.
    pub category: IncidentCategory,
    /// Trimmed, non-empty description.
    pub description: String,
    /// Trimmed location hint; empty strings become `None`.
    pub location: Option<String>,
    /// Validated photo, if one was attached.
    pub photo: Option<RawPhoto>,
}

/// Validates and normalizes a raw report.
///
/// # Errors
///
/// Returns [`ValidationError`] for the first failing rule:
/// - `category` not in the closed enumeration;
/// - `description` empty after trimming, or over the length bound;
/// - `photo` with an unaccepted MIME type, empty, or over the size bound.
pub fn validate(raw: RawReport, limits: &ValidationLimits) -> Result<ValidReport, ValidationError> {
    let category: IncidentCategory = raw.category.parse().map_err(|_| {
        ValidationError::new("category", format!("unrecognized category: {}", raw.category))
    })?;

    let description = raw.description.trim();
    if description.is_empty() {
        return Err(ValidationError::new(
            "description",
            "description must not be empty",
        ));
    }
    if description.chars().count() > limits.max_description_chars {
        return Err(ValidationError::new(
            "description",
            format!(
                "description exceeds {} characters",
                limits.max_description_chars
            ),
        ));
    }

    let photo = match raw.photo {
        None => None,
        Some(photo) => {
            if !ACCEPTED_IMAGE_MIME_TYPES.contains(&photo.mime_type.as_str()) {
                return Err(ValidationError::new(
                    "photo",
                    format!("unaccepted image type: {}", photo.mime_type),
                ));
            }
            if photo.bytes.is_empty() {
                return Err(ValidationError::new("photo", "photo is empty"));
            }
            if photo.bytes.len() > limits.max_photo_bytes {
                return Err(ValidationError::new(
                    "photo",
                    format!("photo exceeds {} bytes", limits.max_photo_bytes),
                ));
            }
            Some(photo)
        }
    };

    let location = raw
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    Ok(ValidReport {
        category,
        description: description.to_string(),
        location,
        photo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(category: &str, description: &str) -> RawReport {
        RawReport {
            category: category.to_string(),
            description: description.to_string(),
            location: None,
            photo: None,
        }
    }

    #[test]
    fn accepts_minimal_valid_report() {
        let valid = validate(
            raw("crime", "  Someone broke a car window on Maple Street  "),
            &ValidationLimits::default(),
        )
        .unwrap();

        assert_eq!(valid.category, IncidentCategory::Crime);
        assert_eq!(valid.description, "Someone broke a car window on Maple Street");
        assert_eq!(valid.location, None);
    }

    #[test]
    fn rejects_unknown_category() {
        let err = validate(raw("weather", "hail incoming"), &ValidationLimits::default())
            .unwrap_err();
        assert_eq!(err.field, "category");
    }

    #[test]
    fn rejects_empty_and_whitespace_descriptions() {
        for description in ["", "   ", "\t\n"] {
            let err =
                validate(raw("other", description), &ValidationLimits::default()).unwrap_err();
            assert_eq!(err.field, "description");
        }
    }

    #[test]
    fn rejects_overlong_description() {
        let long = "x".repeat(2_001);
        let err = validate(raw("other", &long), &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.field, "description");

        let at_limit = "x".repeat(2_000);
        assert!(validate(raw("other", &at_limit), &ValidationLimits::default()).is_ok());
    }

    #[test]
    fn category_failure_wins_over_description_failure() {
        // Fail-fast: first failing rule is reported.
        let err = validate(raw("weather", "   "), &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.field, "category");
    }

    #[test]
    fn rejects_unaccepted_photo_mime() {
        let mut report = raw("vandalism", "graffiti");
        report.photo = Some(RawPhoto {
            mime_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        });
        let err = validate(report, &ValidationLimits::default()).unwrap_err();
        assert_eq!(err.field, "photo");
    }

    #[test]
    fn rejects_oversized_photo() {
        let limits = ValidationLimits {
            max_photo_bytes: 4,
            ..ValidationLimits::default()
        };
        let mut report = raw("vandalism", "graffiti");
        report.photo = Some(RawPhoto {
            mime_type: "image/png".to_string(),
            bytes: vec![0; 5],
        });
        let err = validate(report, &limits).unwrap_err();
        assert_eq!(err.field, "photo");
    }

    #[test]
    fn accepts_valid_photo() {
        let mut report = raw("vandalism", "graffiti");
        report.photo = Some(RawPhoto {
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        });
        let valid = validate(report, &ValidationLimits::default()).unwrap();
        assert!(valid.photo.is_some());
    }

    #[test]
    fn blank_location_becomes_none() {
        let mut report = raw("traffic", "stalled truck");
        report.location = Some("   ".to_string());
        let valid = validate(report, &ValidationLimits::default()).unwrap();
        assert_eq!(valid.location, None);

        let mut report = raw("traffic", "stalled truck");
        report.location = Some("  5th and Main ".to_string());
        let valid = validate(report, &ValidationLimits::default()).unwrap();
        assert_eq!(valid.location, Some("5th and Main".to_string()));
    }
}
