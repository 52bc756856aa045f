//! orform - Structured operating-room records from dictated transcripts
//!
//! Takes a transcript plus the raw output of a token-classification model and
//! produces a fixed-schema OR form, with rule-based overrides for the fields
//! the model gets wrong most often.

pub mod cli;
pub mod config;
pub mod extraction;
pub mod labels;
pub mod model;
pub mod schema;

use thiserror::Error;

pub use extraction::extract;
pub use labels::{align_to_tokens, LabelVocabulary, TagSequence, ValidationError};
pub use schema::OrForm;

/// Main error type for orform
#[derive(Error, Debug)]
pub enum OrFormError {
    #[error("Label validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, OrFormError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "orform";
