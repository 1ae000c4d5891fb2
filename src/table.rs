//! In-memory working table.
//!
//! A [`Table`] is a list of named columns of [`Cell`]s plus a row key with one
//! or more levels. The key plays the role of a row index: it is never renamed,
//! coerced, reordered or stripped by the dictionary operations, and stats rows
//! are labelled through it. A table may also carry a [`StatsAnnotation`]
//! recording which aggregate rows were prepended.

use std::collections::BTreeSet;

use crate::{
    aggregation::Aggregation,
    error::{DataDictError, Result},
    value::{Cell, Value},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn missing(name: impl Into<String>, rows: usize) -> Self {
        Self::new(name, vec![None; rows])
    }
}

/// Aggregations whose synthetic rows were added to a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsAnnotation(BTreeSet<Aggregation>);

impl StatsAnnotation {
    pub fn contains(&self, aggregation: Aggregation) -> bool {
        self.0.contains(&aggregation)
    }

    pub fn iter(&self) -> impl Iterator<Item = Aggregation> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn merge(&mut self, aggregations: impl IntoIterator<Item = Aggregation>) {
        self.0.extend(aggregations);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    key_names: Vec<String>,
    keys: Vec<Vec<Cell>>,
    pub(crate) columns: Vec<Column>,
    pub(crate) stats: Option<StatsAnnotation>,
}

impl Table {
    /// An empty table with the given column names and a single unnamed key level.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_names: vec![String::new()],
            keys: Vec::new(),
            columns: names.into_iter().map(|name| Column::missing(name, 0)).collect(),
            stats: None,
        }
    }

    /// Builds a table from row-major cells, keyed by row position. Short rows
    /// are padded with missing cells and long rows are truncated.
    pub fn from_rows<S: AsRef<str>>(headers: &[S], rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self::new(headers.iter().map(|h| h.as_ref().to_string()));
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Builds a table of raw text, as read from a delimited file. Empty fields
    /// stay present as empty strings until a remap normalises them.
    pub fn from_string_records<S: AsRef<str>>(headers: &[S], records: Vec<Vec<String>>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| record.into_iter().map(|v| Some(Value::String(v))).collect())
            .collect();
        Self::from_rows(headers, rows)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        let position = self.keys.len() as i64;
        let mut key = vec![Some(Value::Integer(position))];
        key.resize(self.key_names.len(), None);
        self.push_keyed_row(key, row);
    }

    fn push_keyed_row(&mut self, key: Vec<Cell>, row: Vec<Cell>) {
        let mut cells = row.into_iter();
        for column in &mut self.columns {
            column.values.push(cells.next().flatten());
        }
        self.keys.push(key);
    }

    /// Moves the named columns into the row key, replacing the current key.
    pub fn set_key<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        if names.is_empty() {
            return Err(DataDictError::config("At least one key column is required."));
        }
        let mut key_columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let column = self
                .column(name)
                .ok_or_else(|| DataDictError::config(format!("Column '{name}' not found.")))?;
            key_columns.push(column);
        }
        let keys = (0..self.row_count())
            .map(|row| key_columns.iter().map(|c| c.values[row].clone()).collect())
            .collect();
        let columns = self
            .columns
            .iter()
            .filter(|c| !names.iter().any(|n| n.as_ref() == c.name))
            .cloned()
            .collect();
        Ok(Table {
            key_names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            keys,
            columns,
            stats: self.stats.clone(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    pub fn keys(&self) -> &[Vec<Cell>] {
        &self.keys
    }

    pub fn key(&self, row: usize) -> Option<&[Cell]> {
        self.keys.get(row).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        self.column(column).and_then(|c| c.values.get(row))
    }

    pub fn stats(&self) -> Option<&StatsAnnotation> {
        self.stats.as_ref()
    }

    /// Appends an all-missing column.
    pub fn add_missing_column(&mut self, name: impl Into<String>) {
        let rows = self.row_count();
        self.columns.push(Column::missing(name, rows));
    }

    /// Keeps the first `rows` rows.
    pub fn head(&self, rows: usize) -> Table {
        let mut table = self.clone();
        table.keys.truncate(rows);
        for column in &mut table.columns {
            column.values.truncate(rows);
        }
        table
    }

    pub(crate) fn with_columns(&self, columns: Vec<Column>) -> Table {
        Table {
            key_names: self.key_names.clone(),
            keys: self.keys.clone(),
            columns,
            stats: self.stats.clone(),
        }
    }

    /// Inserts rows ahead of the existing ones. Each entry is a key and one
    /// cell per column.
    pub(crate) fn prepend_rows(&mut self, rows: Vec<(Vec<Cell>, Vec<Cell>)>) {
        let count = rows.len();
        let mut keys = Vec::with_capacity(count + self.keys.len());
        let mut values: Vec<Vec<Cell>> = self
            .columns
            .iter()
            .map(|c| Vec::with_capacity(count + c.values.len()))
            .collect();
        for (key, row) in rows {
            keys.push(key);
            let mut cells = row.into_iter();
            for column_values in &mut values {
                column_values.push(cells.next().flatten());
            }
        }
        keys.append(&mut self.keys);
        self.keys = keys;
        for (column, mut new_values) in self.columns.iter_mut().zip(values) {
            new_values.append(&mut column.values);
            column.values = new_values;
        }
    }

    /// Header and display rows including the key levels as leading columns.
    /// Missing cells render as empty strings.
    pub fn to_display_rows(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let headers = self
            .key_names
            .iter()
            .cloned()
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect();
        let rows = (0..self.row_count())
            .map(|row| {
                self.keys[row]
                    .iter()
                    .chain(self.columns.iter().map(|c| &c.values[row]))
                    .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect();
        (headers, rows)
    }
}
