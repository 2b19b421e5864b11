//! Error taxonomy for the royalty engine.
//!
//! Domain failures are typed as [`RoyaltyError`]; application glue wraps them in
//! `anyhow::Error` with context. Every variant maps onto an [`ErrorCode`] so log
//! lines can carry a stable numeric code and a coarse category.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable error codes emitted in structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// A raw usage event failed validation or coercion
    MalformedRecord = 1001,
    /// A repeated event key carried conflicting attributes (strict mode only)
    DuplicateKeyConflict = 1002,
    /// The reporting period argument was rejected
    InvalidPeriod = 1003,
    /// Event retrieval failed
    SourceError = 1004,
    /// Workbook rendering or writing failed
    RenderError = 1005,
}

impl ErrorCode {
    /// Get the integer code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Coarse grouping used as a log field
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::MalformedRecord | ErrorCode::InvalidPeriod => "validation_error",
            ErrorCode::DuplicateKeyConflict => "data_inconsistency",
            ErrorCode::SourceError => "io_error",
            ErrorCode::RenderError => "render_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

// =============================================================================
// DOMAIN ERRORS
// =============================================================================

/// Result alias for engine operations.
pub type RoyaltyResult<T> = Result<T, RoyaltyError>;

#[derive(Debug, Error)]
pub enum RoyaltyError {
    /// An event record could not be normalized. Fatal to the whole run.
    #[error("malformed event '{key}': field '{field}' {reason}")]
    MalformedRecord {
        key: String,
        field: &'static str,
        reason: String,
    },

    /// Strict aggregation saw the same (territory, site, title) twice with different data.
    #[error(
        "conflicting duplicate for territory '{territory}', site '{site}', title '{title}': {attribute} differs"
    )]
    DuplicateKeyConflict {
        territory: String,
        site: String,
        title: String,
        attribute: &'static str,
    },

    #[error("invalid reporting period '{input}': {reason}")]
    InvalidPeriod { input: String, reason: String },

    #[error("event source failed: {0}")]
    Source(String),

    #[error("report rendering failed: {0}")]
    Render(String),
}

impl RoyaltyError {
    pub fn malformed(key: &str, field: &'static str, reason: impl Into<String>) -> Self {
        RoyaltyError::MalformedRecord {
            key: key.to_string(),
            field,
            reason: reason.into(),
        }
    }

    pub fn invalid_period(input: impl Into<String>, reason: impl Into<String>) -> Self {
        RoyaltyError::InvalidPeriod {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RoyaltyError::MalformedRecord { .. } => ErrorCode::MalformedRecord,
            RoyaltyError::DuplicateKeyConflict { .. } => ErrorCode::DuplicateKeyConflict,
            RoyaltyError::InvalidPeriod { .. } => ErrorCode::InvalidPeriod,
            RoyaltyError::Source(_) => ErrorCode::SourceError,
            RoyaltyError::Render(_) => ErrorCode::RenderError,
        }
    }

    /// Field name for malformed-record errors, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            RoyaltyError::MalformedRecord { field, .. } => Some(*field),
            _ => None,
        }
    }
}
