//! Error types for the Dietboard reporting pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SheetError`] - spreadsheet (CSV export) parsing errors
//! - [`NormalizeError`] - row normalization errors
//! - [`ReportError`] - top-level report orchestration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Spreadsheet Parsing Errors
// =============================================================================

/// Errors while reading the uploaded spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV structure.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("Spreadsheet is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in spreadsheet")]
    NoHeaders,
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// Errors while coercing raw records into canonical diet-log rows.
///
/// Missing *values* in a row are not errors (they propagate as empty
/// strings); only structural problems with the sheet itself are reported.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// One or more required columns are absent from the header row.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Underlying sheet error.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),
}

// =============================================================================
// Report Errors (top-level)
// =============================================================================

/// Top-level report orchestration errors.
///
/// This is the main error type returned by [`crate::report::build_report_from_bytes`].
/// It wraps all lower-level errors and adds report-specific variants.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Sheet parsing error.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Normalization error.
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Unsupported target duration.
    #[error("Unsupported target duration: {0} days (expected 1, 7, 15 or 30)")]
    InvalidTargetDuration(u32),

    /// No rows to aggregate.
    #[error("No rows to aggregate")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Report error.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for normalization operations.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
