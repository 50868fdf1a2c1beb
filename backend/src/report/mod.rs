//! High-level report pipeline: sheet bytes to a full dashboard report.
//!
//! Combines all stages: normalization, duration detection, filtering, the
//! four grouped aggregations, raw-material totals and the dynamic filter
//! option lists. Every call is a full recompute from the row set; the
//! caller re-runs it on each filter or duration change.
//!
//! # Example
//!
//! ```rust,ignore
//! use dietboard::report::{build_report_from_path, ReportOptions};
//! use std::path::Path;
//!
//! let report = build_report_from_path(
//!     Path::new("diet_plan.csv"),
//!     ReportOptions::default(),
//! )?;
//! println!("{} ingredient types", report.ingredient_types.data.len());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::api::logs::{log_info, log_success};
use crate::duration::{duration_context, is_valid_target};
use crate::engine::{
    choice_group_totals, combo_totals, ingredient_type_totals, raw_material_totals, recipe_totals,
    FilteredRows, OriginalRows, RawMaterialReport, SummaryReport,
};
use crate::error::{ReportError, ReportResult};
use crate::filter::{apply_global_filters, consumer_counts, dynamic_options};
use crate::models::{DietLogRow, DurationContext, FilterField, FilterState};
use crate::parser::{parse_bytes_auto, parse_file_auto, ParseResult};

/// Options for one report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Active filter selection.
    pub filters: FilterState,

    /// Target duration in days (1, 7, 15 or 30). `None` follows the
    /// detected input duration.
    pub target_days: Option<u32>,
}

/// Spreadsheet metadata carried alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct SheetInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Everything the dashboard renders for one filter state.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    /// Ingredient-type view.
    pub ingredient_types: SummaryReport,

    /// Recipe view.
    pub recipes: SummaryReport,

    /// Combo-group view.
    pub combos: SummaryReport,

    /// Choice-group view.
    pub choice_groups: SummaryReport,

    /// Flat per-day raw-material view.
    pub raw_materials: RawMaterialReport,

    /// Remaining selectable values per filter dimension, given the other
    /// active filters.
    pub filter_options: BTreeMap<String, Vec<String>>,

    /// The filter state this report was computed for.
    pub filters: FilterState,

    /// Detected input duration and the target the report is scaled to.
    pub duration: DurationContext,

    /// Rows surviving the active filters.
    pub filtered_row_count: usize,

    /// Sheet metadata.
    pub sheet_info: SheetInfo,
}

/// Build a report from a spreadsheet file.
pub fn build_report_from_path(path: &Path, options: ReportOptions) -> ReportResult<DashboardReport> {
    let parsed = parse_file_auto(path)?;
    build_report(parsed, options)
}

/// Build a report from uploaded spreadsheet bytes.
pub fn build_report_from_bytes(bytes: &[u8], options: ReportOptions) -> ReportResult<DashboardReport> {
    let parsed = parse_bytes_auto(bytes)?;
    build_report(parsed, options)
}

/// Build a report from already-normalized rows.
pub fn build_report(parsed: ParseResult, options: ReportOptions) -> ReportResult<DashboardReport> {
    log_info("Reading diet plan...");
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected delimiter: '{}'", parsed.delimiter));
    log_success(format!("Normalized {} rows", parsed.rows.len()));

    if parsed.rows.is_empty() {
        return Err(ReportError::EmptyInput);
    }

    if let Some(days) = options.target_days {
        if !is_valid_target(days) {
            return Err(ReportError::InvalidTargetDuration(days));
        }
    }

    let sheet_info = SheetInfo {
        encoding: parsed.encoding.clone(),
        delimiter: parsed.delimiter,
        headers: parsed.headers.clone(),
        row_count: parsed.rows.len(),
    };

    let rows = parsed.rows;
    let ctx = duration_context(&rows, options.target_days);
    log_success(format!(
        "Planning cycle: {} day(s), reporting over {} day(s)",
        ctx.actual_input_days, ctx.target_output_days
    ));

    log_info("Applying filters...");
    let filtered = apply_global_filters(&rows, &options.filters);
    let counts = consumer_counts(&filtered);
    log_success(format!(
        "{} of {} rows in current view ({} animals, {} species)",
        filtered.len(),
        rows.len(),
        counts.total_animals,
        counts.total_species
    ));

    log_info("Aggregating views...");
    let report = compute_views(&rows, &filtered, ctx, &options.filters, sheet_info);
    log_success(format!(
        "{} ingredient types, {} recipes, {} combos, {} choice groups, {} raw materials",
        report.ingredient_types.data.len(),
        report.recipes.data.len(),
        report.combos.data.len(),
        report.choice_groups.data.len(),
        report.raw_materials.data.len()
    ));

    Ok(report)
}

/// Run all five aggregation pipelines plus the option lists.
fn compute_views(
    rows: &[DietLogRow],
    filtered: &[DietLogRow],
    ctx: DurationContext,
    filters: &FilterState,
    sheet_info: SheetInfo,
) -> DashboardReport {
    let original = OriginalRows(rows);
    let in_view = FilteredRows(filtered);
    let counts = consumer_counts(filtered);

    let filter_options: BTreeMap<String, Vec<String>> = FilterField::ALL
        .iter()
        .map(|&field| (field.name().to_string(), dynamic_options(rows, field, filters)))
        .collect();

    DashboardReport {
        ingredient_types: ingredient_type_totals(original, in_view, counts, ctx),
        recipes: recipe_totals(original, in_view, counts, ctx),
        combos: combo_totals(original, in_view, counts, ctx),
        choice_groups: choice_group_totals(original, in_view, counts, ctx),
        raw_materials: raw_material_totals(in_view, counts, ctx.actual_input_days),
        filter_options,
        filters: filters.clone(),
        duration: ctx,
        filtered_row_count: filtered.len(),
        sheet_info,
    }
}
