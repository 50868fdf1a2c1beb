//! Domain models for the Dietboard aggregation pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`DietLogRow`] - one normalized line of a diet plan
//! - [`RowKind`] - structural classification of a row's `type` column
//! - [`FilterState`] - the active facility/time-of-day filter selection
//! - [`TimeWindow`] - an inclusive minute-of-day window
//! - [`FilterField`] - the five categorical filter dimensions
//! - [`DurationContext`] - input/output duration pair driving all scaling
//! - [`ConsumerCounts`] - distinct animal/species counts over a row set

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Diet Log Row
// =============================================================================

/// One normalized line of a diet plan spreadsheet.
///
/// Rows are immutable once parsed; the engine only derives aggregates from
/// them. Missing values propagate as empty strings rather than being
/// rejected, and `ingredient_qty` is always non-negative after
/// normalization (parse failures coerce to 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietLogRow {
    /// Identifier of the animal the row feeds.
    pub animal_id: String,
    /// Facility site name.
    pub site_name: String,
    /// Section within the site.
    pub section_name: String,
    /// User-facing enclosure name.
    pub enclosure_name: String,
    /// Species common name.
    pub common_name: String,
    /// Taxonomic class name.
    pub class_name: String,
    /// Ingredient being fed.
    pub ingredient_name: String,
    /// Dietary unit category: a free-form type such as "Fruit"/"Hay", or one
    /// of the structural markers `recipe`, `combo`, `ingredientwithchoice`.
    pub ingredient_type: String,
    /// Recipe/combo/choice-group name; meaningless for plain-type rows.
    pub type_name: String,
    /// Preparation style.
    pub preparation_type_name: String,
    /// Cut size.
    pub cut_size_name: String,
    /// Quantity in `base_uom_name` units over the source period.
    pub ingredient_qty: f64,
    /// Unit of measure.
    pub base_uom_name: String,
    /// Free-text time-of-day label (e.g. "8:00 AM", "14:30").
    pub meal_time: String,
    /// Calendar date, when it parsed.
    pub date: Option<NaiveDate>,
    /// Raw date text as it appeared in the sheet (preserved even when
    /// unparseable).
    pub date_raw: String,
}

impl DietLogRow {
    /// Structural classification of this row's `type` column.
    pub fn kind(&self) -> RowKind {
        RowKind::from_type(&self.ingredient_type)
    }

    /// Trimmed meal-time label, the unit of the per-group meal-time axis.
    pub fn meal_time_trimmed(&self) -> &str {
        self.meal_time.trim()
    }
}

// =============================================================================
// Row Kind
// =============================================================================

/// Structural classification of a row by its `type` column.
///
/// Three reserved markers denote grouped dietary units; everything else is a
/// plain ingredient-type row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Plain row with a free-form ingredient type ("Fruit", "Hay", ...).
    Ingredient,
    /// Single prepared dish.
    Recipe,
    /// Grouped co-offered items.
    Combo,
    /// Alternative-ingredient options.
    Choice,
}

impl RowKind {
    /// Classify a raw `type` value. Markers match case-insensitively.
    pub fn from_type(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "recipe" => Self::Recipe,
            "combo" => Self::Combo,
            "ingredientwithchoice" => Self::Choice,
            _ => Self::Ingredient,
        }
    }
}

// =============================================================================
// Time Window
// =============================================================================

/// An inclusive minute-of-day window, both bounds in `[0, 1439]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start, minutes after midnight.
    pub start_minutes: u16,
    /// Window end, minutes after midnight (inclusive).
    pub end_minutes: u16,
}

impl TimeWindow {
    /// Whether a minute-of-day value falls inside the window.
    pub fn contains(&self, minutes: u16) -> bool {
        minutes >= self.start_minutes && minutes <= self.end_minutes
    }
}

// =============================================================================
// Filter State
// =============================================================================

/// The active filter selection: five categorical lists plus an optional
/// time-of-day window.
///
/// An empty list means "no restriction" for that dimension. `time_window`
/// of `None` means "all day" and keeps every row regardless of whether its
/// meal time parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Selected site names.
    pub sites: Vec<String>,
    /// Selected section names.
    pub sections: Vec<String>,
    /// Selected enclosure names.
    pub enclosures: Vec<String>,
    /// Selected taxonomic class names.
    pub classes: Vec<String>,
    /// Selected species common names.
    pub species: Vec<String>,
    /// Optional time-of-day window.
    pub time_window: Option<TimeWindow>,
}

impl FilterState {
    /// True when no categorical filter nor time window is active.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
            && self.sections.is_empty()
            && self.enclosures.is_empty()
            && self.classes.is_empty()
            && self.species.is_empty()
            && self.time_window.is_none()
    }

    /// The selection list governing one categorical field.
    pub fn selection(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Site => &self.sites,
            FilterField::Section => &self.sections,
            FilterField::Enclosure => &self.enclosures,
            FilterField::Class => &self.classes,
            FilterField::Species => &self.species,
        }
    }

    /// A copy of this state with one categorical filter cleared.
    ///
    /// Used to compute dynamic option lists: a filter must never hide its
    /// own options.
    pub fn without(&self, field: FilterField) -> Self {
        let mut cleared = self.clone();
        match field {
            FilterField::Site => cleared.sites.clear(),
            FilterField::Section => cleared.sections.clear(),
            FilterField::Enclosure => cleared.enclosures.clear(),
            FilterField::Class => cleared.classes.clear(),
            FilterField::Species => cleared.species.clear(),
        }
        cleared
    }
}

// =============================================================================
// Filter Field
// =============================================================================

/// The five categorical filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Site,
    Section,
    Enclosure,
    Class,
    Species,
}

impl FilterField {
    /// All dimensions, in display order.
    pub const ALL: [FilterField; 5] = [
        FilterField::Site,
        FilterField::Section,
        FilterField::Enclosure,
        FilterField::Class,
        FilterField::Species,
    ];

    /// Parse a field name as used on the CLI and in API payloads.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "site" | "site_name" => Some(Self::Site),
            "section" | "section_name" => Some(Self::Section),
            "enclosure" | "enclosure_name" | "user_enclosure_name" => Some(Self::Enclosure),
            "class" | "class_name" => Some(Self::Class),
            "species" | "common_name" => Some(Self::Species),
            _ => None,
        }
    }

    /// Canonical field name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Section => "section",
            Self::Enclosure => "enclosure",
            Self::Class => "class",
            Self::Species => "species",
        }
    }

    /// The row value this dimension filters on.
    pub fn value_of<'a>(&self, row: &'a DietLogRow) -> &'a str {
        match self {
            Self::Site => &row.site_name,
            Self::Section => &row.section_name,
            Self::Enclosure => &row.enclosure_name,
            Self::Class => &row.class_name,
            Self::Species => &row.common_name,
        }
    }
}

// =============================================================================
// Duration Context
// =============================================================================

/// Target durations the dashboard can rescale to, in days.
pub const VALID_TARGET_DAYS: [u32; 4] = [1, 7, 15, 30];

/// The input/output duration pair driving every quantity scaling.
///
/// `actual_input_days` is detected once from the sheet's date span (1 or 7)
/// and fixed for the session; `target_output_days` is user-selectable.
/// All scaling passes through the per-day rate:
/// `(raw_sum / actual_input_days) * target_output_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationContext {
    /// Number of days the source data covers.
    pub actual_input_days: u32,
    /// Number of days the report is scaled to.
    pub target_output_days: u32,
}

impl DurationContext {
    /// Build a context. A zero input duration is treated as 1 so the
    /// per-day division can never divide by zero.
    pub fn new(actual_input_days: u32, target_output_days: u32) -> Self {
        Self {
            actual_input_days: actual_input_days.max(1),
            target_output_days,
        }
    }

    /// Per-day rate of a raw sum over the source period.
    pub fn per_day(&self, raw_sum: f64) -> f64 {
        raw_sum / self.actual_input_days as f64
    }

    /// Raw sum rescaled to the target duration, via the per-day rate.
    pub fn scale(&self, raw_sum: f64) -> f64 {
        self.per_day(raw_sum) * self.target_output_days as f64
    }
}

// =============================================================================
// Consumer Counts
// =============================================================================

/// Distinct animal/species counts over a row set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerCounts {
    /// Distinct non-empty `animal_id` values.
    pub total_animals: usize,
    /// Distinct non-empty `common_name` values.
    pub total_species: usize,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_type(t: &str) -> DietLogRow {
        DietLogRow {
            ingredient_type: t.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_row_kind_markers() {
        assert_eq!(row_with_type("recipe").kind(), RowKind::Recipe);
        assert_eq!(row_with_type("Combo").kind(), RowKind::Combo);
        assert_eq!(
            row_with_type(" IngredientWithChoice ").kind(),
            RowKind::Choice
        );
        assert_eq!(row_with_type("Fruit").kind(), RowKind::Ingredient);
        assert_eq!(row_with_type("").kind(), RowKind::Ingredient);
    }

    #[test]
    fn test_time_window_inclusive() {
        let window = TimeWindow {
            start_minutes: 480,
            end_minutes: 600,
        };
        assert!(window.contains(480));
        assert!(window.contains(600));
        assert!(!window.contains(479));
        assert!(!window.contains(601));
    }

    #[test]
    fn test_filter_state_without_clears_only_target() {
        let state = FilterState {
            sites: vec!["North".into()],
            species: vec!["Gorilla".into()],
            time_window: Some(TimeWindow {
                start_minutes: 0,
                end_minutes: 720,
            }),
            ..Default::default()
        };

        let cleared = state.without(FilterField::Site);
        assert!(cleared.sites.is_empty());
        assert_eq!(cleared.species, vec!["Gorilla".to_string()]);
        // The time window never clears: it governs no categorical field.
        assert!(cleared.time_window.is_some());
    }

    #[test]
    fn test_filter_field_from_name() {
        assert_eq!(FilterField::from_name("site"), Some(FilterField::Site));
        assert_eq!(
            FilterField::from_name("user_enclosure_name"),
            Some(FilterField::Enclosure)
        );
        assert_eq!(
            FilterField::from_name("COMMON_NAME"),
            Some(FilterField::Species)
        );
        assert_eq!(FilterField::from_name("meal_time"), None);
    }

    #[test]
    fn test_duration_context_zero_guard() {
        let ctx = DurationContext::new(0, 7);
        assert_eq!(ctx.actual_input_days, 1);
        assert_eq!(ctx.per_day(14.0), 14.0);
    }

    #[test]
    fn test_duration_scaling_goes_through_per_day_rate() {
        let ctx = DurationContext::new(7, 30);
        assert_eq!(ctx.per_day(14.0), 2.0);
        assert_eq!(ctx.scale(14.0), 60.0);
    }

    #[test]
    fn test_filter_state_roundtrip() {
        let state = FilterState {
            classes: vec!["Mammalia".into()],
            time_window: Some(TimeWindow {
                start_minutes: 360,
                end_minutes: 1020,
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: FilterState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn test_filter_state_deserializes_partial_payload() {
        // API clients send only the filters they use.
        let state: FilterState = serde_json::from_str(r#"{"sites":["North"]}"#).unwrap();
        assert_eq!(state.sites, vec!["North".to_string()]);
        assert!(state.time_window.is_none());
    }
}
