//! Filter engine: categorical and time-of-day row selection.
//!
//! Filtering is a pure conjunction: a row survives when every active
//! categorical filter contains its field value and, when a time window is
//! set, its meal time parses to a minute-of-day inside the window. The
//! module also computes the dynamic "what can I still pick" option lists
//! and the global consumer counts shown in report headers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::models::{ConsumerCounts, DietLogRow, FilterField, FilterState};

// =============================================================================
// Meal-time parsing
// =============================================================================

static TWELVE_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(AM|PM)$").expect("valid 12h pattern"));

static TWENTY_FOUR_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("valid 24h pattern"));

/// Parse a free-text meal-time label to minutes after midnight.
///
/// Two grammars are accepted after stripping whitespace and normalizing
/// case: `H:MM AM/PM` (hour 1-12) and `H:MM` / `H:MM:SS` (hour 0-23).
/// Anything else returns `None` rather than an error; callers decide what
/// an unparseable label means for their view.
pub fn parse_meal_time(raw: &str) -> Option<u16> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if let Some(caps) = TWELVE_HOUR.captures(&cleaned) {
        let hour: u16 = caps[1].parse().ok()?;
        let minute: u16 = caps[2].parse().ok()?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        let offset = if &caps[3] == "PM" { 720 } else { 0 };
        return Some((hour % 12) * 60 + minute + offset);
    }

    if let Some(caps) = TWENTY_FOUR_HOUR.captures(&cleaned) {
        let hour: u16 = caps[1].parse().ok()?;
        let minute: u16 = caps[2].parse().ok()?;
        let second: u16 = caps
            .get(3)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))?;
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        return Some(hour * 60 + minute);
    }

    None
}

// =============================================================================
// Global filtering
// =============================================================================

/// Whether a single row survives the active filter state.
fn row_matches(row: &DietLogRow, filters: &FilterState) -> bool {
    for field in FilterField::ALL {
        let selection = filters.selection(field);
        if selection.is_empty() {
            continue;
        }
        let value = field.value_of(row);
        // A missing field value never matches an active filter.
        if value.is_empty() || !selection.iter().any(|s| s == value) {
            return false;
        }
    }

    if let Some(window) = filters.time_window {
        // Rows whose meal time does not parse are excluded whenever a
        // window is set; "all day" keeps them.
        match parse_meal_time(&row.meal_time) {
            Some(minutes) => window.contains(minutes),
            None => false,
        }
    } else {
        true
    }
}

/// Apply the full filter conjunction to a row set.
///
/// Returns fresh owned rows; input order is preserved.
pub fn apply_global_filters(rows: &[DietLogRow], filters: &FilterState) -> Vec<DietLogRow> {
    rows.iter()
        .filter(|row| row_matches(row, filters))
        .cloned()
        .collect()
}

// =============================================================================
// Consumer counts
// =============================================================================

/// Distinct animal/species counts over a row set.
///
/// Empty identifiers are not animals and are never counted.
pub fn consumer_counts(rows: &[DietLogRow]) -> ConsumerCounts {
    let mut animals = BTreeSet::new();
    let mut species = BTreeSet::new();
    for row in rows {
        if !row.animal_id.is_empty() {
            animals.insert(row.animal_id.as_str());
        }
        if !row.common_name.is_empty() {
            species.insert(row.common_name.as_str());
        }
    }
    ConsumerCounts {
        total_animals: animals.len(),
        total_species: species.len(),
    }
}

// =============================================================================
// Dynamic filter options
// =============================================================================

/// Remaining selectable values for one filter dimension.
///
/// Re-applies every filter *except* the one governing `field` (a filter
/// must never hide its own options; the time window always applies), then
/// returns the sorted distinct non-empty values left in that column. Always
/// computed against the full unfiltered row set, never incrementally.
pub fn dynamic_options(
    all_rows: &[DietLogRow],
    field: FilterField,
    filters: &FilterState,
) -> Vec<String> {
    let others = filters.without(field);
    let values: BTreeSet<String> = all_rows
        .iter()
        .filter(|row| row_matches(row, &others))
        .map(|row| field.value_of(row).to_string())
        .filter(|value| !value.is_empty())
        .collect();
    values.into_iter().collect()
}
