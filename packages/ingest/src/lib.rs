#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report validation and the incident ingestion pipeline.
//!
//! The ingestion service is the only writer of the incident store. A
//! submission flows validate → persist (`pending_classification`) →
//! classify → compare-and-set the result. The persist happens before the
//! classifier runs, so a report is durable even when classification is
//! slow, failing, or unavailable — the classifier only ever upgrades an
//! already-acknowledged record.

pub mod service;
pub mod validate;

use safehaven_photos::PhotoError;
use safehaven_store::StoreError;
use thiserror::Error;

pub use service::{IngestConfig, IngestService};
pub use validate::{RawPhoto, RawReport, ValidReport, ValidationError, ValidationLimits};

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The submitted report failed validation; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An incident store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A photo storage operation failed.
    #[error(transparent)]
    Photo(#[from] PhotoError),
}
