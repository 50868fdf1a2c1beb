//! The four grouped aggregation pipelines.
//!
//! One shared algorithm serves all four views; the pipelines differ only in
//! which rows they select, which field names their groups, and how many
//! decimals they keep (recipe/combo/choice formulations are per-animal
//! sized and need the extra precision).
//!
//! Two row sets flow through every pipeline and must never be swapped:
//! the globally *filtered* set drives all quantity math, while the
//! *original* set drives group enumeration, the meal-time axis and every
//! consumer set ("who overall eats this, across the whole facility").

use std::collections::{BTreeMap, BTreeSet};

use super::types::{
    round_to, ConsumerSets, FilteredRows, GroupSummary, LineItem, OriginalRows, SummaryReport,
};
use crate::models::{ConsumerCounts, DietLogRow, DurationContext, RowKind};

/// Decimals kept in the ingredient-type view.
const TYPE_VIEW_PRECISION: u32 = 2;
/// Decimals kept in the recipe/combo/choice views.
const GROUP_VIEW_PRECISION: u32 = 4;

/// What distinguishes one grouped pipeline from another.
struct PipelineSpec {
    kind: RowKind,
    precision: u32,
    representative_uom: bool,
    whole_group_totals: bool,
}

/// The field naming a row's group within a pipeline.
fn group_key(row: &DietLogRow, kind: RowKind) -> &str {
    match kind {
        RowKind::Ingredient => &row.ingredient_type,
        _ => &row.type_name,
    }
}

// =============================================================================
// Public pipelines
// =============================================================================

/// Ingredient-type view: plain rows grouped by their free-form `type`.
pub fn ingredient_type_totals(
    original: OriginalRows,
    filtered: FilteredRows,
    counts: ConsumerCounts,
    ctx: DurationContext,
) -> SummaryReport {
    aggregate(
        original,
        filtered,
        counts,
        ctx,
        PipelineSpec {
            kind: RowKind::Ingredient,
            precision: TYPE_VIEW_PRECISION,
            representative_uom: false,
            whole_group_totals: false,
        },
    )
}

/// Recipe view: `recipe` rows grouped by `type_name`, with whole-recipe
/// quantity totals independent of meal-time slicing.
pub fn recipe_totals(
    original: OriginalRows,
    filtered: FilteredRows,
    counts: ConsumerCounts,
    ctx: DurationContext,
) -> SummaryReport {
    aggregate(
        original,
        filtered,
        counts,
        ctx,
        PipelineSpec {
            kind: RowKind::Recipe,
            precision: GROUP_VIEW_PRECISION,
            representative_uom: true,
            whole_group_totals: true,
        },
    )
}

/// Combo view: `combo` rows grouped by `type_name`.
pub fn combo_totals(
    original: OriginalRows,
    filtered: FilteredRows,
    counts: ConsumerCounts,
    ctx: DurationContext,
) -> SummaryReport {
    aggregate(
        original,
        filtered,
        counts,
        ctx,
        PipelineSpec {
            kind: RowKind::Combo,
            precision: GROUP_VIEW_PRECISION,
            representative_uom: true,
            whole_group_totals: false,
        },
    )
}

/// Choice-group view: `ingredientwithchoice` rows grouped by `type_name`.
pub fn choice_group_totals(
    original: OriginalRows,
    filtered: FilteredRows,
    counts: ConsumerCounts,
    ctx: DurationContext,
) -> SummaryReport {
    aggregate(
        original,
        filtered,
        counts,
        ctx,
        PipelineSpec {
            kind: RowKind::Choice,
            precision: GROUP_VIEW_PRECISION,
            representative_uom: true,
            whole_group_totals: false,
        },
    )
}

// =============================================================================
// Shared algorithm
// =============================================================================

fn aggregate(
    original: OriginalRows,
    filtered: FilteredRows,
    counts: ConsumerCounts,
    ctx: DurationContext,
    spec: PipelineSpec,
) -> SummaryReport {
    let original_rows: Vec<&DietLogRow> =
        original.0.iter().filter(|r| r.kind() == spec.kind).collect();
    let filtered_rows: Vec<&DietLogRow> =
        filtered.0.iter().filter(|r| r.kind() == spec.kind).collect();

    // Groups enumerate from the original rows: a group whose rows were all
    // removed by the current filter still reports, with zeroed quantities,
    // instead of vanishing from the view.
    let group_names: BTreeSet<&str> = original_rows
        .iter()
        .map(|r| group_key(r, spec.kind))
        .collect();

    let data = group_names
        .into_iter()
        .map(|name| {
            let group_original: Vec<&DietLogRow> = original_rows
                .iter()
                .copied()
                .filter(|r| group_key(r, spec.kind) == name)
                .collect();
            let group_filtered: Vec<&DietLogRow> = filtered_rows
                .iter()
                .copied()
                .filter(|r| group_key(r, spec.kind) == name)
                .collect();
            summarize_group(name, &group_original, &group_filtered, ctx, &spec)
        })
        .collect();

    SummaryReport::new(data, counts)
}

fn summarize_group(
    name: &str,
    group_original: &[&DietLogRow],
    group_filtered: &[&DietLogRow],
    ctx: DurationContext,
    spec: &PipelineSpec,
) -> GroupSummary {
    // The axis is fixed from the original rows, so a meal time emptied by
    // the filter keeps its column. Non-empty labels only, parseable or not.
    let meal_times: Vec<String> = group_original
        .iter()
        .map(|r| r.meal_time_trimmed())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect();

    let overall = ConsumerSets::collect(group_original.iter().copied());

    let per_meal_time: BTreeMap<String, ConsumerSets> = meal_times
        .iter()
        .map(|slot| {
            let sets = ConsumerSets::collect(
                group_original
                    .iter()
                    .copied()
                    .filter(|r| r.meal_time_trimmed() == slot),
            );
            (slot.clone(), sets)
        })
        .collect();

    // Line items come from the filtered rows: they carry the quantities.
    let item_keys: BTreeSet<(&str, &str, &str, &str)> = group_filtered
        .iter()
        .map(|r| {
            (
                r.ingredient_name.as_str(),
                r.preparation_type_name.as_str(),
                r.cut_size_name.as_str(),
                r.base_uom_name.as_str(),
            )
        })
        .collect();

    let mut items = Vec::with_capacity(item_keys.len());
    let mut uom_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut group_per_day = 0.0;

    for (ingredient, prep, cut, uom) in item_keys {
        let item_rows: Vec<&DietLogRow> = group_filtered
            .iter()
            .copied()
            .filter(|r| {
                r.ingredient_name == ingredient
                    && r.preparation_type_name == prep
                    && r.cut_size_name == cut
                    && r.base_uom_name == uom
            })
            .collect();

        let mut quantities_by_meal_time = BTreeMap::new();
        let mut total_for_target = 0.0;
        for slot in &meal_times {
            let raw: f64 = item_rows
                .iter()
                .filter(|r| r.meal_time_trimmed() == slot)
                .map(|r| r.ingredient_qty)
                .sum();
            let scaled = round_to(ctx.scale(raw), spec.precision);
            total_for_target += scaled;
            quantities_by_meal_time.insert(slot.clone(), scaled);
        }
        let total_for_target = round_to(total_for_target, spec.precision);

        let raw_total: f64 = item_rows.iter().map(|r| r.ingredient_qty).sum();
        let per_day = ctx.per_day(raw_total);
        group_per_day += per_day;

        *uom_totals.entry(uom.to_string()).or_insert(0.0) += total_for_target;

        items.push(LineItem {
            ingredient_name: ingredient.to_string(),
            preparation_type_name: prep.to_string(),
            cut_size_name: cut.to_string(),
            base_uom_name: uom.to_string(),
            quantities_by_meal_time,
            total_for_target_duration: total_for_target,
            qty_per_day: round_to(per_day, spec.precision),
        });
    }

    for total in uom_totals.values_mut() {
        *total = round_to(*total, spec.precision);
    }

    let representative_uom = if spec.representative_uom {
        dominant_uom(&items)
    } else {
        None
    };
    let representative_uom_total = representative_uom
        .as_ref()
        .and_then(|uom| uom_totals.get(uom).copied());

    let (total_qty_per_day, total_qty_for_target_duration) = if spec.whole_group_totals {
        (
            Some(round_to(group_per_day, spec.precision)),
            Some(round_to(
                group_per_day * ctx.target_output_days as f64,
                spec.precision,
            )),
        )
    } else {
        (None, None)
    };

    GroupSummary {
        group_name: name.to_string(),
        meal_times,
        items,
        total_quantities_for_target_duration: uom_totals,
        overall,
        per_meal_time,
        representative_uom,
        representative_uom_total,
        total_qty_per_day,
        total_qty_for_target_duration,
    }
}

/// Most frequent unit among the group's items; ties go to the
/// first-encountered unit in item order.
fn dominant_uom(items: &[LineItem]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(uom, _)| *uom == item.base_uom_name) {
            Some((_, n)) => *n += 1,
            None => counts.push((&item.base_uom_name, 1)),
        }
    }
    let max = counts.iter().map(|(_, n)| *n).max()?;
    counts
        .iter()
        .find(|(_, n)| *n == max)
        .map(|(uom, _)| uom.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply_global_filters, consumer_counts};
    use crate::models::FilterState;
    use chrono::NaiveDate;

    struct RowSpec<'a> {
        animal: &'a str,
        species: &'a str,
        enclosure: &'a str,
        ingredient: &'a str,
        kind: &'a str,
        group: &'a str,
        qty: f64,
        uom: &'a str,
        meal_time: &'a str,
        day: u32,
    }

    impl Default for RowSpec<'_> {
        fn default() -> Self {
            Self {
                animal: "A-1",
                species: "Gorilla",
                enclosure: "Gorilla House",
                ingredient: "Banana",
                kind: "Fruit",
                group: "",
                qty: 1.0,
                uom: "kg",
                meal_time: "8:00 AM",
                day: 1,
            }
        }
    }

    fn row(spec: RowSpec) -> DietLogRow {
        DietLogRow {
            animal_id: spec.animal.to_string(),
            site_name: "North".to_string(),
            section_name: "Primates".to_string(),
            enclosure_name: spec.enclosure.to_string(),
            common_name: spec.species.to_string(),
            class_name: "Mammalia".to_string(),
            ingredient_name: spec.ingredient.to_string(),
            ingredient_type: spec.kind.to_string(),
            type_name: spec.group.to_string(),
            ingredient_qty: spec.qty,
            base_uom_name: spec.uom.to_string(),
            meal_time: spec.meal_time.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, spec.day),
            ..Default::default()
        }
    }

    /// Two gorillas eating one banana unit each, every day for a week.
    fn banana_week() -> Vec<DietLogRow> {
        let mut rows = Vec::new();
        for day in 1..=7 {
            for animal in ["A-1", "A-2"] {
                rows.push(row(RowSpec {
                    animal,
                    day,
                    ..Default::default()
                }));
            }
        }
        rows
    }

    fn report(rows: &[DietLogRow], ctx: DurationContext) -> SummaryReport {
        ingredient_type_totals(
            OriginalRows(rows),
            FilteredRows(rows),
            consumer_counts(rows),
            ctx,
        )
    }

    #[test]
    fn test_banana_week_scenario() {
        // 14 rows over Jan 1-7: per-day rate 2.0, target 7 -> 14.0 total.
        let rows = banana_week();
        let result = report(&rows, DurationContext::new(7, 7));

        assert_eq!(result.data.len(), 1);
        let fruit = &result.data[0];
        assert_eq!(fruit.group_name, "Fruit");
        assert_eq!(fruit.total_quantities_for_target_duration["kg"], 14.0);
        assert_eq!(fruit.overall.animal_count, 2);
        assert_eq!(fruit.overall.species_animal_counts["Gorilla"], 2);
        assert_eq!(fruit.items.len(), 1);
        assert_eq!(fruit.items[0].qty_per_day, 2.0);
        assert_eq!(fruit.meal_times, vec!["8:00 AM".to_string()]);
    }

    #[test]
    fn test_duration_scaling_law() {
        let rows = banana_week();
        for target in [1u32, 7, 15, 30] {
            let result = report(&rows, DurationContext::new(7, target));
            let total = result.data[0].total_quantities_for_target_duration["kg"];
            // quantity(target) == per-day rate * target
            assert_eq!(total, 2.0 * target as f64, "target {target}");
        }
    }

    #[test]
    fn test_recipe_whole_group_totals() {
        // Two ingredient lines at two meal times; the whole-recipe figure
        // is the sum of the items' own per-day rates, independent of how
        // many meal-time columns exist.
        let rows = vec![
            row(RowSpec {
                ingredient: "Oats",
                kind: "recipe",
                group: "Enrichment Mix",
                qty: 3.0,
                meal_time: "8:00 AM",
                ..Default::default()
            }),
            row(RowSpec {
                ingredient: "Honey",
                kind: "recipe",
                group: "Enrichment Mix",
                qty: 1.0,
                uom: "g",
                meal_time: "2:00 PM",
                ..Default::default()
            }),
        ];
        let ctx = DurationContext::new(1, 7);
        let result = recipe_totals(
            OriginalRows(&rows),
            FilteredRows(&rows),
            consumer_counts(&rows),
            ctx,
        );

        let mix = &result.data[0];
        assert_eq!(mix.group_name, "Enrichment Mix");
        assert_eq!(mix.items.len(), 2);

        let item_per_day_sum: f64 = mix.items.iter().map(|i| i.qty_per_day).sum();
        assert_eq!(mix.total_qty_per_day, Some(item_per_day_sum));
        assert_eq!(mix.total_qty_per_day, Some(4.0));
        assert_eq!(mix.total_qty_for_target_duration, Some(28.0));
        assert_eq!(mix.meal_times.len(), 2);
    }

    #[test]
    fn test_pipelines_partition_by_kind() {
        let rows = vec![
            row(RowSpec::default()),
            row(RowSpec {
                kind: "recipe",
                group: "Mix",
                ..Default::default()
            }),
            row(RowSpec {
                kind: "combo",
                group: "Morning Combo",
                ..Default::default()
            }),
            row(RowSpec {
                kind: "ingredientwithchoice",
                group: "Fruit Choice",
                ..Default::default()
            }),
        ];
        let ctx = DurationContext::new(1, 1);
        let counts = consumer_counts(&rows);

        let types = ingredient_type_totals(OriginalRows(&rows), FilteredRows(&rows), counts, ctx);
        let recipes = recipe_totals(OriginalRows(&rows), FilteredRows(&rows), counts, ctx);
        let combos = combo_totals(OriginalRows(&rows), FilteredRows(&rows), counts, ctx);
        let choices = choice_group_totals(OriginalRows(&rows), FilteredRows(&rows), counts, ctx);

        assert_eq!(types.data[0].group_name, "Fruit");
        assert_eq!(recipes.data[0].group_name, "Mix");
        assert_eq!(combos.data[0].group_name, "Morning Combo");
        assert_eq!(choices.data[0].group_name, "Fruit Choice");
        for view in [&types, &recipes, &combos, &choices] {
            assert_eq!(view.data.len(), 1);
        }
    }

    #[test]
    fn test_partition_completeness() {
        // Summing all group UOM totals reproduces the flat scaled sum
        // computed directly from the filtered plain rows.
        let mut rows = banana_week();
        rows.push(row(RowSpec {
            ingredient: "Timothy Hay",
            kind: "Hay",
            qty: 4.0,
            meal_time: "2:00 PM",
            ..Default::default()
        }));
        rows.push(row(RowSpec {
            kind: "recipe",
            group: "Mix",
            qty: 100.0,
            ..Default::default()
        }));

        let ctx = DurationContext::new(7, 7);
        let result = report(&rows, ctx);

        let grouped_total: f64 = result
            .data
            .iter()
            .flat_map(|g| g.total_quantities_for_target_duration.values())
            .sum();
        let direct_total: f64 = rows
            .iter()
            .filter(|r| r.kind() == RowKind::Ingredient)
            .map(|r| ctx.scale(r.ingredient_qty))
            .sum();
        assert!((grouped_total - direct_total).abs() < 1e-9);
    }

    #[test]
    fn test_group_survives_emptying_filter() {
        // Filters that remove every Fruit row must not drop the group.
        let original = banana_week();
        let filters = FilterState {
            species: vec!["Macaw".into()],
            ..Default::default()
        };
        let filtered = apply_global_filters(&original, &filters);
        assert!(filtered.is_empty());

        let result = ingredient_type_totals(
            OriginalRows(&original),
            FilteredRows(&filtered),
            consumer_counts(&filtered),
            DurationContext::new(7, 7),
        );

        assert_eq!(result.data.len(), 1);
        let fruit = &result.data[0];
        assert_eq!(fruit.group_name, "Fruit");
        assert!(fruit.items.is_empty());
        assert!(fruit.total_quantities_for_target_duration.is_empty());
        // Overall consumers still describe the whole facility.
        assert_eq!(fruit.overall.animal_count, 2);
        assert_eq!(result.total_animals, 0);
    }

    #[test]
    fn test_axis_fixed_from_original_rows() {
        let mut original = banana_week();
        original.push(row(RowSpec {
            animal: "A-3",
            qty: 5.0,
            meal_time: "2:00 PM",
            day: 1,
            ..Default::default()
        }));

        // Filter keeps only the morning rows.
        let filtered: Vec<DietLogRow> = original
            .iter()
            .filter(|r| r.meal_time == "8:00 AM")
            .cloned()
            .collect();

        let result = ingredient_type_totals(
            OriginalRows(&original),
            FilteredRows(&filtered),
            consumer_counts(&filtered),
            DurationContext::new(7, 7),
        );

        let fruit = &result.data[0];
        // The afternoon column survives with a zero quantity, and its
        // consumer breakdown still comes from the original rows.
        assert_eq!(
            fruit.meal_times,
            vec!["2:00 PM".to_string(), "8:00 AM".to_string()]
        );
        assert_eq!(fruit.items[0].quantities_by_meal_time["2:00 PM"], 0.0);
        assert_eq!(fruit.per_meal_time["2:00 PM"].animal_count, 1);
        assert_eq!(fruit.per_meal_time["2:00 PM"].animals, vec!["A-3"]);
    }

    #[test]
    fn test_overall_contains_per_meal_time_union() {
        let mut rows = banana_week();
        rows.push(row(RowSpec {
            animal: "A-3",
            meal_time: "2:00 PM",
            ..Default::default()
        }));

        let result = report(&rows, DurationContext::new(7, 7));
        let fruit = &result.data[0];

        for sets in fruit.per_meal_time.values() {
            for animal in &sets.animals {
                assert!(fruit.overall.animals.contains(animal));
            }
            for enclosure in &sets.enclosures {
                assert!(fruit.overall.enclosures.contains(enclosure));
            }
            for species in sets.species_animal_counts.keys() {
                assert!(fruit.overall.species_animal_counts.contains_key(species));
            }
        }

        // Every row here has a meal time, so the union is exact.
        let union: std::collections::BTreeSet<&String> = fruit
            .per_meal_time
            .values()
            .flat_map(|s| s.animals.iter())
            .collect();
        assert_eq!(union.len(), fruit.overall.animal_count);
    }

    #[test]
    fn test_unparseable_meal_time_still_a_column() {
        // "25:00" never parses, but it is a defined label and so keeps a
        // place on the axis.
        let rows = vec![row(RowSpec {
            meal_time: "25:00",
            ..Default::default()
        })];
        let result = report(&rows, DurationContext::new(1, 1));
        assert_eq!(result.data[0].meal_times, vec!["25:00".to_string()]);
    }

    #[test]
    fn test_empty_meal_time_not_a_column() {
        let rows = vec![
            row(RowSpec::default()),
            row(RowSpec {
                meal_time: "",
                qty: 3.0,
                ..Default::default()
            }),
        ];
        let result = report(&rows, DurationContext::new(1, 1));
        assert_eq!(result.data[0].meal_times, vec!["8:00 AM".to_string()]);
    }

    #[test]
    fn test_empty_group_name_quirk_kept() {
        // A recipe row with a blank type_name aggregates under the literal
        // empty name rather than being dropped.
        let rows = vec![row(RowSpec {
            kind: "recipe",
            group: "",
            ..Default::default()
        })];
        let result = recipe_totals(
            OriginalRows(&rows),
            FilteredRows(&rows),
            consumer_counts(&rows),
            DurationContext::new(1, 1),
        );
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].group_name, "");
    }

    #[test]
    fn test_dominant_uom_ties_to_first_encountered() {
        let rows = vec![
            row(RowSpec {
                ingredient: "Apple",
                kind: "combo",
                group: "Snack",
                uom: "g",
                ..Default::default()
            }),
            row(RowSpec {
                ingredient: "Carrot",
                kind: "combo",
                group: "Snack",
                uom: "kg",
                ..Default::default()
            }),
        ];
        let result = combo_totals(
            OriginalRows(&rows),
            FilteredRows(&rows),
            consumer_counts(&rows),
            DurationContext::new(1, 1),
        );
        // One item each: the tie goes to the first item in sorted order
        // (Apple, "g").
        assert_eq!(result.data[0].representative_uom.as_deref(), Some("g"));
        assert_eq!(result.data[0].representative_uom_total, Some(1.0));
    }

    #[test]
    fn test_dominant_uom_majority_wins() {
        let rows = vec![
            row(RowSpec {
                ingredient: "Apple",
                kind: "combo",
                group: "Snack",
                uom: "g",
                ..Default::default()
            }),
            row(RowSpec {
                ingredient: "Carrot",
                kind: "combo",
                group: "Snack",
                uom: "kg",
                ..Default::default()
            }),
            row(RowSpec {
                ingredient: "Beet",
                kind: "combo",
                group: "Snack",
                uom: "kg",
                ..Default::default()
            }),
        ];
        let result = combo_totals(
            OriginalRows(&rows),
            FilteredRows(&rows),
            consumer_counts(&rows),
            DurationContext::new(1, 1),
        );
        assert_eq!(result.data[0].representative_uom.as_deref(), Some("kg"));
    }

    #[test]
    fn test_recompute_is_identical() {
        let rows = banana_week();
        let ctx = DurationContext::new(7, 30);
        let first = report(&rows, ctx);
        let second = report(&rows, ctx);
        assert_eq!(first, second);
    }

    #[test]
    fn test_line_items_split_by_preparation() {
        let mut rows = vec![row(RowSpec::default())];
        let mut chopped = row(RowSpec {
            qty: 2.0,
            ..Default::default()
        });
        chopped.preparation_type_name = "Chopped".to_string();
        rows.push(chopped);

        let result = report(&rows, DurationContext::new(1, 1));
        let fruit = &result.data[0];
        assert_eq!(fruit.items.len(), 2);
        assert_eq!(fruit.total_quantities_for_target_duration["kg"], 3.0);
    }
}
