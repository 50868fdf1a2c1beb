//! Flat raw-material totals.
//!
//! The shopping-list view: no grouping by type, no meal-time axis, and no
//! target-duration rescaling. Quantities are always per-day rates, summed
//! per ingredient and unit over the globally filtered rows. Choice rows are
//! the only exclusion; a plain-type row counts here even when it is also
//! summarized in another view.

use std::collections::BTreeMap;

use super::types::{round_to, FilteredRows, RawMaterialReport, RawMaterialTotal};
use crate::models::{ConsumerCounts, RowKind};

/// Decimals kept in the raw-material view.
const RAW_VIEW_PRECISION: u32 = 2;

/// Per-day ingredient totals over the filtered rows.
pub fn raw_material_totals(
    filtered: FilteredRows,
    counts: ConsumerCounts,
    actual_input_days: u32,
) -> RawMaterialReport {
    // Same zero guard as DurationContext: never divide by zero.
    let days = actual_input_days.max(1) as f64;

    let mut sums: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for row in filtered.0 {
        if row.kind() == RowKind::Choice {
            continue;
        }
        *sums
            .entry((&row.ingredient_name, &row.base_uom_name))
            .or_insert(0.0) += row.ingredient_qty;
    }

    let data = sums
        .into_iter()
        .map(|((ingredient, uom), raw_sum)| RawMaterialTotal {
            ingredient_name: ingredient.to_string(),
            base_uom_name: uom.to_string(),
            qty_per_day: round_to(raw_sum / days, RAW_VIEW_PRECISION),
        })
        .collect();

    RawMaterialReport {
        data,
        total_animals: counts.total_animals,
        total_species: counts.total_species,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DietLogRow;

    fn row(ingredient: &str, kind: &str, qty: f64, uom: &str) -> DietLogRow {
        DietLogRow {
            animal_id: "A-1".to_string(),
            common_name: "Gorilla".to_string(),
            ingredient_name: ingredient.to_string(),
            ingredient_type: kind.to_string(),
            ingredient_qty: qty,
            base_uom_name: uom.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sums_per_ingredient_and_uom() {
        let rows = vec![
            row("Banana", "Fruit", 7.0, "kg"),
            row("Banana", "Fruit", 7.0, "kg"),
            row("Banana", "Fruit", 500.0, "g"),
            row("Hay", "Forage", 21.0, "kg"),
        ];
        let counts = ConsumerCounts {
            total_animals: 1,
            total_species: 1,
        };
        let report = raw_material_totals(FilteredRows(&rows), counts, 7);

        assert_eq!(report.data.len(), 3);
        // Sorted by (ingredient, uom); per-day rates over the 7-day input.
        assert_eq!(report.data[0].ingredient_name, "Banana");
        assert_eq!(report.data[0].base_uom_name, "g");
        assert_eq!(report.data[0].qty_per_day, 71.43);
        assert_eq!(report.data[1].base_uom_name, "kg");
        assert_eq!(report.data[1].qty_per_day, 2.0);
        assert_eq!(report.data[2].ingredient_name, "Hay");
        assert_eq!(report.data[2].qty_per_day, 3.0);
        assert_eq!(report.total_animals, 1);
    }

    #[test]
    fn test_excludes_only_choice_rows() {
        let rows = vec![
            row("Banana", "Fruit", 1.0, "kg"),
            row("Herbivore Mix", "recipe", 2.0, "kg"),
            row("Morning Combo", "combo", 3.0, "kg"),
            row("Fruit Option", "ingredientwithchoice", 4.0, "kg"),
        ];
        let report = raw_material_totals(FilteredRows(&rows), ConsumerCounts::default(), 1);

        let names: Vec<&str> = report
            .data
            .iter()
            .map(|t| t.ingredient_name.as_str())
            .collect();
        assert_eq!(names, vec!["Banana", "Herbivore Mix", "Morning Combo"]);
    }

    #[test]
    fn test_zero_duration_guard() {
        let rows = vec![row("Banana", "Fruit", 5.0, "kg")];
        let report = raw_material_totals(FilteredRows(&rows), ConsumerCounts::default(), 0);
        assert_eq!(report.data[0].qty_per_day, 5.0);
    }
}
