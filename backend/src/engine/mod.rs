//! Aggregation engine: differently-grouped summaries of one flat row set.
//!
//! Pure, synchronous computation over in-memory rows. The caller supplies
//! two row sets — the original rows as loaded and the globally filtered
//! rows — wrapped in [`OriginalRows`] / [`FilteredRows`] so the two can
//! never be swapped. Every filter or duration change is a full recompute;
//! no state is carried between invocations.

mod grouped;
mod raw;
mod types;

pub use grouped::{choice_group_totals, combo_totals, ingredient_type_totals, recipe_totals};
pub use raw::raw_material_totals;
pub use types::{
    ConsumerSets, FilteredRows, GroupSummary, LineItem, OriginalRows, RawMaterialReport,
    RawMaterialTotal, SummaryReport,
};
