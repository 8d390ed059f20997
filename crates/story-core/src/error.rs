//! Error types for Story Core
//!
//! Provides the error handling for:
//! - Submission admission (length and rate limit checks)
//! - Content validation through the external model
//! - Text generation backends
//! - Story store reads and writes
//! - Device identity resolution

use crate::types::cooldown_window;
use std::path::PathBuf;

/// Message shown for every failure that is not the submitter's fault
pub const GENERIC_FAILURE_MESSAGE: &str =
    "We apologize, but we couldn't add your sentence. Please try again later.";

/// Outcome of a rejected or failed submission
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Trimmed candidate was empty
    #[error("empty input")]
    EmptyInput,

    /// Trimmed candidate is below the minimum length
    #[error("sentence too short: {len} chars (min {min})")]
    TooShort { len: usize, min: usize },

    /// Trimmed candidate is above the maximum length
    #[error("sentence too long: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    /// Device already contributed within the cooldown window
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
        /// Configured cooldown, for the message
        cooldown_secs: u64,
    },

    /// The validator judged the sentence unfit for the story
    #[error("rejected by validator: {0}")]
    ValidatorRejected(String),

    /// The validator reply could not be understood
    #[error("malformed validator response: {0}")]
    MalformedValidatorResponse(String),

    /// The validator did not answer in time
    #[error("validator timed out after {duration_secs}s")]
    ValidatorTimeout { duration_secs: u64 },

    /// One or both writes of an accepted sentence failed
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    /// Any other store or validator failure
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

impl SubmissionError {
    /// Message to display to the submitter
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => "Please enter a sentence.".to_string(),
            Self::TooShort { min, .. } => {
                format!("Please ensure your sentence is at least {min} characters long.")
            }
            Self::TooLong { max, .. } => format!("Your sentence should be within {max} characters."),
            Self::RateLimited { cooldown_secs, .. } => format!(
                "Each device can submit once per {} to ensure everyone gets a fair chance. \
                 Please return later to contribute again. Thank you for your patience!",
                cooldown_window(*cooldown_secs)
            ),
            Self::ValidatorRejected(reason) => reason.clone(),
            Self::MalformedValidatorResponse(_)
            | Self::ValidatorTimeout { .. }
            | Self::PersistenceFailed(_)
            | Self::SubmissionFailed(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Stable machine-readable code
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::TooShort { .. } => "too_short",
            Self::TooLong { .. } => "too_long",
            Self::RateLimited { .. } => "rate_limited",
            Self::ValidatorRejected(_) => "validator_rejected",
            Self::MalformedValidatorResponse(_) => "malformed_validator_response",
            Self::ValidatorTimeout { .. } => "validator_timeout",
            Self::PersistenceFailed(_) => "persistence_failed",
            Self::SubmissionFailed(_) => "submission_failed",
        }
    }

    /// Check if the submitter can fix the problem by editing the sentence
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::TooShort { .. } | Self::TooLong { .. } | Self::ValidatorRejected(_)
        )
    }
}

impl From<ValidatorError> for SubmissionError {
    fn from(err: ValidatorError) -> Self {
        match err {
            ValidatorError::Malformed(detail) => Self::MalformedValidatorResponse(detail),
            ValidatorError::Generation(source) => Self::SubmissionFailed(source.to_string()),
        }
    }
}

/// Errors raised by a content validator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorError {
    /// Reply was not the expected JSON shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The text-generation backend failed
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Errors raised by a text-generation backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Transport failure (connect, TLS, body read)
    #[error("http error: {0}")]
    Http(String),

    /// Backend answered with a non-success status
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered without any text
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Backend misconfigured (missing key, bad endpoint)
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a story store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error against the backing file
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored document could not be (de)serialized
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// Backend refused or lost the write
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Backend unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while resolving the device identifier
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// IO error reading or creating the installation id
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Provided identifier is unusable
    #[error("invalid device identifier: {0}")]
    Invalid(String),
}
