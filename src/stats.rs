//! Summary rows and default aggregations.

use log::debug;

use crate::{
    aggregation::Aggregation,
    dictionary::Dictionary,
    table::{Column, Table},
    value::{Cell, Value},
};

/// Prepends a `Total` and an `Average` row computed over every numeric
/// column. Other columns are missing in those rows. With a multi-level row
/// key only the first level carries the label.
///
/// The table is annotated with the applied aggregations, merged with any
/// earlier annotation. Calling this twice prepends a second pair of rows.
pub fn add_stats(table: &Table) -> Table {
    let numeric = table.columns().iter().map(is_numeric_column).collect::<Vec<_>>();
    prepend_stats(table, &numeric)
}

fn prepend_stats(table: &Table, numeric: &[bool]) -> Table {
    let levels = table.key_names().len().max(1);

    let rows = Aggregation::STATS
        .iter()
        .map(|aggregation| {
            let mut key: Vec<Cell> = vec![Some(Value::String(aggregation.label().to_string()))];
            key.resize(levels, None);
            let cells = table
                .columns()
                .iter()
                .zip(numeric)
                .map(|(column, is_numeric)| {
                    if *is_numeric {
                        aggregation.apply(&column.values)
                    } else {
                        None
                    }
                })
                .collect();
            (key, cells)
        })
        .collect();

    let mut result = table.clone();
    result.prepend_rows(rows);
    result
        .stats
        .get_or_insert_with(Default::default)
        .merge(Aggregation::STATS);
    result
}

/// Whether [`add_stats`] has been applied to `table`.
pub fn has_stats(table: &Table) -> bool {
    table.stats().is_some()
}

/// A column counts as numeric when it holds at least one value and all of its
/// values are integers or floats.
fn is_numeric_column(column: &Column) -> bool {
    let mut present = column.values.iter().flatten().peekable();
    present.peek().is_some() && present.all(Value::is_numeric)
}

impl Dictionary {
    /// [`add_stats`] that also summarises all-missing columns declared with a
    /// numeric type. Their `Total` is zero and their `Average` is missing.
    pub fn add_stats(&self, table: &Table) -> Table {
        let numeric = table
            .columns()
            .iter()
            .map(|column| {
                is_numeric_column(column)
                    || (column.values.iter().all(Option::is_none)
                        && self
                            .definition(&column.name)
                            .is_some_and(|d| d.field_type.is_numeric()))
            })
            .collect::<Vec<_>>();
        prepend_stats(table, &numeric)
    }

    /// Applies each column's `Default Aggregation`. Columns without one, or
    /// unknown to the dictionary, are skipped.
    pub fn aggregate(&self, table: &Table) -> Vec<(String, Cell)> {
        table
            .columns()
            .iter()
            .filter_map(|column| {
                let aggregation = self
                    .definition(&column.name)
                    .and_then(|d| d.default_aggregation);
                match aggregation {
                    Some(aggregation) => {
                        Some((column.name.clone(), aggregation.apply(&column.values)))
                    }
                    None => {
                        debug!("No default aggregation for column '{}'", column.name);
                        None
                    }
                }
            })
            .collect()
    }
}
