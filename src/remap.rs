//! Column renaming, type coercion and canonical ordering.

use std::collections::HashSet;

use log::debug;

use crate::{
    dictionary::{Dictionary, FieldDefinition},
    error::{DataDictError, Result},
    field_type::FieldType,
    table::{Column, Table},
    value::{Cell, Value},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapOptions {
    /// Append the data set's missing canonical columns as empty columns.
    pub ensure_cols: bool,
    /// Drop every column that does not belong to the data set.
    pub strip_cols: bool,
}

/// The entries of one data set (or of all of them), looked up by `Field`.
#[derive(Debug, Clone)]
pub struct DataSetView<'a> {
    entries: Vec<&'a FieldDefinition>,
}

impl<'a> DataSetView<'a> {
    /// The entry mapping `field`. When several entries share a field the
    /// last one wins.
    pub fn by_field(&self, field: &str) -> Option<&'a FieldDefinition> {
        self.entries
            .iter()
            .rev()
            .find(|d| d.field.as_deref() == Some(field))
            .copied()
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a FieldDefinition> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Dictionary {
    /// Entries of `data_set` (`None` and `""` both select the entries without a
    /// data set), or every entry when `any_data_set` is set.
    pub fn filtered_view(
        &self,
        data_set: Option<&str>,
        any_data_set: bool,
    ) -> Result<DataSetView<'_>> {
        if any_data_set && data_set.is_some() {
            return Err(DataDictError::config(
                "Either a data set can be provided or any_data_set can be set, but not both.",
            ));
        }
        let data_set = data_set.unwrap_or("");
        let entries = self
            .definitions()
            .iter()
            .filter(|d| any_data_set || d.in_data_set(data_set))
            .collect();
        Ok(DataSetView { entries })
    }

    pub fn remap(&self, table: &Table, data_set: Option<&str>) -> Result<Table> {
        self.remap_with(table, data_set, RemapOptions::default())
    }

    /// Renames the columns of `table` from the data set's `Field`s to their
    /// `Name`s, converts their values to the declared types and puts them in
    /// canonical order.
    ///
    /// Blank strings become missing values before any conversion. Boolean
    /// columns map `yes`/`true`/`1` (any case) to `true` and every other string
    /// to `false`. A column whose values cannot all be converted to its type
    /// is left as it was.
    pub fn remap_with(
        &self,
        table: &Table,
        data_set: Option<&str>,
        options: RemapOptions,
    ) -> Result<Table> {
        let data_set = data_set.filter(|d| !d.is_empty());
        if options.ensure_cols && data_set.is_none() {
            return Err(DataDictError::config(
                "A data set is required when ensure_cols is requested.",
            ));
        }

        let view = self.filtered_view(Some(data_set.unwrap_or("")), false)?;

        let columns = table
            .columns()
            .iter()
            .map(|column| match view.by_field(&column.name) {
                Some(definition) => remap_column(column, definition),
                None => Column::new(column.name.clone(), blanks_to_missing(&column.values)),
            })
            .collect();

        let mut remapped = self.reorder(&table.with_columns(columns));
        if options.ensure_cols {
            remapped = self.ensure_cols(&remapped, None, data_set)?;
        }
        if options.strip_cols {
            remapped = self.strip_cols(&remapped, data_set, false)?;
        }
        Ok(remapped)
    }

    /// Puts the columns known to the dictionary first, in dictionary order,
    /// followed by the others in their original order.
    pub fn reorder(&self, table: &Table) -> Table {
        let mut columns = table.columns().to_vec();
        columns.sort_by_key(|c| self.position(&c.name).unwrap_or(usize::MAX));
        table.with_columns(columns)
    }

    /// Appends the columns of `cols`, or of the data set's names when `cols`
    /// is not given, that are neither a column nor a key level of `table`.
    pub fn ensure_cols(
        &self,
        table: &Table,
        cols: Option<&[&str]>,
        data_set: Option<&str>,
    ) -> Result<Table> {
        let wanted = match (cols, data_set) {
            (Some(_), Some(_)) => {
                return Err(DataDictError::config(
                    "Either the columns or the data set can be provided, but not both.",
                ));
            }
            (Some(cols), None) => cols.to_vec(),
            (None, data_set) => self.filtered_view(data_set, false)?.names(),
        };

        let mut result = table.clone();
        for name in wanted {
            let present = result.has_column(name) || table.key_names().iter().any(|k| k == name);
            if !present {
                result.add_missing_column(name);
            }
        }
        Ok(result)
    }

    /// Keeps only the columns whose name belongs to the data set, or to any
    /// data set when `any_data_set` is set. The row key is never touched.
    pub fn strip_cols(
        &self,
        table: &Table,
        data_set: Option<&str>,
        any_data_set: bool,
    ) -> Result<Table> {
        let names = self
            .filtered_view(data_set, any_data_set)?
            .names()
            .into_iter()
            .collect::<HashSet<_>>();
        let columns = table
            .columns()
            .iter()
            .filter(|c| names.contains(c.name.as_str()))
            .cloned()
            .collect();
        Ok(table.with_columns(columns))
    }
}

fn remap_column(column: &Column, definition: &FieldDefinition) -> Column {
    let values = match definition.field_type {
        FieldType::Str => column.values.iter().map(normalize_text).collect(),
        FieldType::Bool => column
            .values
            .iter()
            .map(|cell| parse_bool(blank_to_missing(cell)))
            .collect(),
        other => {
            let values = blanks_to_missing(&column.values);
            match other.coerce_column(&values) {
                Ok(coerced) => coerced,
                Err(reason) => {
                    debug!(
                        "Keeping column '{}' unconverted: {} (declared type {})",
                        column.name, reason, other
                    );
                    values
                }
            }
        }
    };
    Column::new(definition.name.clone(), values)
}

fn blank_to_missing(cell: &Cell) -> Cell {
    match cell {
        Some(Value::String(s)) if s.is_empty() => None,
        other => other.clone(),
    }
}

fn blanks_to_missing(values: &[Cell]) -> Vec<Cell> {
    values.iter().map(blank_to_missing).collect()
}

/// String columns hold strings or nothing.
fn normalize_text(cell: &Cell) -> Cell {
    match cell {
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(_)) | None => cell.clone(),
        Some(other) => Some(Value::String(other.as_display())),
    }
}

fn parse_bool(cell: Cell) -> Cell {
    match cell {
        Some(Value::String(s)) => {
            let lowered = s.to_lowercase();
            Some(Value::Boolean(matches!(
                lowered.as_str(),
                "yes" | "true" | "1"
            )))
        }
        other => other,
    }
}
