//! # Dietboard - diet-plan spreadsheet aggregation for animal facilities
//!
//! Dietboard ingests a zoo/animal-facility diet-plan spreadsheet and derives
//! the aggregated views a husbandry dashboard renders: ingredient-type
//! totals, recipes, combo groups, choice groups and raw materials, filtered
//! by facility attributes and time-of-day and normalized across 1-day and
//! 7-day planning cycles.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Sheet (CSV) │────▶│  Normalizer │────▶│   Filters   │────▶│ Aggregated  │
//! │ (auto-enc)  │     │ + duration  │     │ (5 dims +   │     │ views (x5)  │
//! └─────────────┘     └─────────────┘     │ time window)│     └─────────────┘
//!                                         └─────────────┘
//! ```
//!
//! The aggregation engine works from two row sets that must never be
//! swapped: the *original* rows drive group enumeration, meal-time axes and
//! all consumer sets, while the globally *filtered* rows drive every
//! quantity. The [`engine::OriginalRows`] / [`engine::FilteredRows`]
//! wrappers enforce the distinction at the type level.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dietboard::report::{build_report_from_path, ReportOptions};
//! use std::path::Path;
//!
//! let report = build_report_from_path(
//!     Path::new("diet_plan.csv"),
//!     ReportOptions::default(),
//! ).unwrap();
//! println!("{} ingredient types", report.ingredient_types.data.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (DietLogRow, FilterState, DurationContext)
//! - [`parser`] - Sheet normalization with auto-detection
//! - [`duration`] - Planning-cycle detection
//! - [`filter`] - Categorical and time-of-day filtering
//! - [`engine`] - The aggregation pipelines
//! - [`report`] - Full-report orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Normalization
pub mod parser;

// Duration detection
pub mod duration;

// Filtering
pub mod filter;

// Aggregation
pub mod engine;

// Orchestration
pub mod report;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{NormalizeError, ReportError, ServerError, SheetError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ConsumerCounts, DietLogRow, DurationContext, FilterField, FilterState, RowKind, TimeWindow,
    VALID_TARGET_DAYS,
};

// =============================================================================
// Re-exports - Normalizer
// =============================================================================

pub use parser::{
    canonical_header, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    ParseResult,
};

// =============================================================================
// Re-exports - Duration
// =============================================================================

pub use duration::{default_target_days, detect_input_days, duration_context, is_valid_target};

// =============================================================================
// Re-exports - Filter engine
// =============================================================================

pub use filter::{apply_global_filters, consumer_counts, dynamic_options, parse_meal_time};

// =============================================================================
// Re-exports - Aggregation engine
// =============================================================================

pub use engine::{
    choice_group_totals, combo_totals, ingredient_type_totals, raw_material_totals, recipe_totals,
    ConsumerSets, FilteredRows, GroupSummary, LineItem, OriginalRows, RawMaterialReport,
    RawMaterialTotal, SummaryReport,
};

// =============================================================================
// Re-exports - Report pipeline
// =============================================================================

pub use report::{
    build_report, build_report_from_bytes, build_report_from_path, DashboardReport, ReportOptions,
    SheetInfo,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ResponseMetadata, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
