//! Output structures and row-set wrappers for the aggregation engine.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ConsumerCounts, DietLogRow};

// =============================================================================
// Row-set wrappers
// =============================================================================

/// The unfiltered row set as loaded from the sheet.
///
/// Consumer sets ("who overall eats this") are always computed from these
/// rows; wrapping the slice keeps them from being confused with the
/// filtered set, which would silently corrupt every report.
#[derive(Debug, Clone, Copy)]
pub struct OriginalRows<'a>(pub &'a [DietLogRow]);

/// The globally filtered row set driving all quantity math.
#[derive(Debug, Clone, Copy)]
pub struct FilteredRows<'a>(pub &'a [DietLogRow]);

// =============================================================================
// Consumer sets
// =============================================================================

/// Distinct consumers associated with a group or a meal-time slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsumerSets {
    /// Distinct animal ids, sorted.
    pub animals: Vec<String>,
    /// Number of distinct animals.
    pub animal_count: usize,
    /// Species common name to distinct-animal-count map.
    pub species_animal_counts: BTreeMap<String, usize>,
    /// Number of distinct species.
    pub species_count: usize,
    /// Distinct enclosure names, sorted.
    pub enclosures: Vec<String>,
}

impl ConsumerSets {
    /// Collect distinct consumers from a row iterator.
    ///
    /// Empty identifiers are skipped; an absent id is not an animal. One
    /// collector serves both the overall and the per-meal-time sets so the
    /// two can never diverge in policy.
    pub fn collect<'a>(rows: impl Iterator<Item = &'a DietLogRow>) -> Self {
        let mut animals: BTreeSet<&str> = BTreeSet::new();
        let mut by_species: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut enclosures: BTreeSet<&str> = BTreeSet::new();

        for row in rows {
            if !row.animal_id.is_empty() {
                animals.insert(&row.animal_id);
            }
            if !row.common_name.is_empty() {
                let species_animals = by_species.entry(&row.common_name).or_default();
                if !row.animal_id.is_empty() {
                    species_animals.insert(&row.animal_id);
                }
            }
            if !row.enclosure_name.is_empty() {
                enclosures.insert(&row.enclosure_name);
            }
        }

        let species_animal_counts: BTreeMap<String, usize> = by_species
            .into_iter()
            .map(|(species, ids)| (species.to_string(), ids.len()))
            .collect();

        Self {
            animal_count: animals.len(),
            animals: animals.into_iter().map(String::from).collect(),
            species_count: species_animal_counts.len(),
            species_animal_counts,
            enclosures: enclosures.into_iter().map(String::from).collect(),
        }
    }
}

// =============================================================================
// Line items and group summaries
// =============================================================================

/// One line of a group table: an ingredient in a specific preparation, cut
/// size and unit of measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub ingredient_name: String,
    pub preparation_type_name: String,
    pub cut_size_name: String,
    pub base_uom_name: String,
    /// Scaled quantity per meal-time column; every axis slot is present,
    /// zero-filled when the filtered rows carry nothing for it.
    pub quantities_by_meal_time: BTreeMap<String, f64>,
    /// Sum of the per-meal-time scaled quantities.
    pub total_for_target_duration: f64,
    /// Per-day rate over all of this item's filtered rows, independent of
    /// meal-time slicing.
    pub qty_per_day: f64,
}

/// One named group: an ingredient type, a recipe, a combo group or a
/// choice group, with its pivot-table breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group_name: String,
    /// Group-specific meal-time axis: sorted distinct trimmed labels from
    /// the original (unfiltered) group rows.
    pub meal_times: Vec<String>,
    pub items: Vec<LineItem>,
    /// Group totals per unit of measure, scaled to the target duration.
    pub total_quantities_for_target_duration: BTreeMap<String, f64>,
    /// Who overall eats this group, ignoring the active categorical
    /// filters.
    pub overall: ConsumerSets,
    /// Overall sets recomputed per meal-time slot, from the same original
    /// rows.
    pub per_meal_time: BTreeMap<String, ConsumerSets>,
    /// Most frequent unit among the group's items (recipe/combo/choice
    /// views only); mixed-UOM groups have no single true total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_uom: Option<String>,
    /// Group total in the representative unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_uom_total: Option<f64>,
    /// Whole-group per-day quantity, summed over item per-day rates
    /// (recipe view only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_qty_per_day: Option<f64>,
    /// Whole-group quantity for the target duration (recipe view only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_qty_for_target_duration: Option<f64>,
}

/// A full grouped view plus the global consumer counts for the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub data: Vec<GroupSummary>,
    pub total_animals: usize,
    pub total_species: usize,
}

impl SummaryReport {
    pub(crate) fn new(data: Vec<GroupSummary>, counts: ConsumerCounts) -> Self {
        Self {
            data,
            total_animals: counts.total_animals,
            total_species: counts.total_species,
        }
    }
}

// =============================================================================
// Raw materials
// =============================================================================

/// Per-day total for one ingredient in one unit of measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawMaterialTotal {
    pub ingredient_name: String,
    pub base_uom_name: String,
    /// Always a per-day rate; this view never rescales to the target
    /// duration.
    pub qty_per_day: f64,
}

/// The flat raw-material view plus global consumer counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawMaterialReport {
    pub data: Vec<RawMaterialTotal>,
    pub total_animals: usize,
    pub total_species: usize,
}

// =============================================================================
// Rounding
// =============================================================================

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
