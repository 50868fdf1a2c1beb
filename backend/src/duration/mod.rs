//! Duration detection for diet-plan sheets.
//!
//! Husbandry exports come in two planning cycles: a single day or a full
//! week. The cycle is detected once from the date span at load time and
//! fixed for the session; every aggregation pipeline normalizes quantities
//! through the resulting per-day rate.

use std::collections::BTreeSet;

use crate::models::{DietLogRow, DurationContext, VALID_TARGET_DAYS};

/// Detect whether the rows describe a 1-day or 7-day planning cycle.
///
/// Rows whose date did not parse are ignored; a sheet with no parseable
/// dates detects as a single day. More than one distinct calendar day means
/// the export covers a weekly cycle.
pub fn detect_input_days(rows: &[DietLogRow]) -> u32 {
    let distinct_dates: BTreeSet<_> = rows.iter().filter_map(|row| row.date).collect();
    if distinct_dates.len() > 1 {
        7
    } else {
        1
    }
}

/// Default target duration whenever the detected input duration changes.
///
/// Presentation policy: report over the same span the data was planned for.
pub fn default_target_days(actual_input_days: u32) -> u32 {
    actual_input_days.max(1)
}

/// Whether a user-selected target duration is one the dashboard offers.
pub fn is_valid_target(days: u32) -> bool {
    VALID_TARGET_DAYS.contains(&days)
}

/// Build the session duration context from detected input and an optional
/// user selection.
pub fn duration_context(rows: &[DietLogRow], target_days: Option<u32>) -> DurationContext {
    let actual = detect_input_days(rows);
    DurationContext::new(actual, target_days.unwrap_or_else(|| default_target_days(actual)))
}
