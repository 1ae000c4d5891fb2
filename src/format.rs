//! Rendering of table values through the dictionary's format templates.

use log::warn;

use crate::{
    aggregation::Aggregation,
    dictionary::Dictionary,
    table::{Column, Table},
    template::Template,
    value::{Cell, Value},
};

/// Placeholder for missing values in formatted columns.
pub const MISSING_PLACEHOLDER: &str = "-";

/// A column left unformatted because its template could not render one of
/// its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatWarning {
    pub column: String,
    pub message: String,
}

impl Dictionary {
    /// Renders every column that has a format template into strings.
    ///
    /// Missing values become `-` in every column. Present values of columns
    /// without a template are kept as they are. When the table carries `Average` rows, integer directives are
    /// widened to one decimal so the averages stay readable. The row key is
    /// never formatted.
    pub fn format(&self, table: &Table) -> Table {
        self.format_with_warnings(table).0
    }

    /// Like [`Dictionary::format`], also returning a warning per column left
    /// unformatted. A column is formatted entirely or not at all.
    pub fn format_with_warnings(&self, table: &Table) -> (Table, Vec<FormatWarning>) {
        let widen = table
            .stats()
            .is_some_and(|stats| stats.contains(Aggregation::Mean));
        let mut warnings = Vec::new();

        let columns = table
            .columns()
            .iter()
            .map(|column| {
                let Some(template) = self.format_of(&column.name) else {
                    return fill_missing(column);
                };
                match format_column(column, template, widen) {
                    Ok(formatted) => formatted,
                    Err(message) => {
                        warn!(
                            "Could not format column '{}' with '{}': {}",
                            column.name, template, message
                        );
                        warnings.push(FormatWarning {
                            column: column.name.clone(),
                            message,
                        });
                        column.clone()
                    }
                }
            })
            .collect();
        (table.with_columns(columns), warnings)
    }
}

fn fill_missing(column: &Column) -> Column {
    let values = column
        .values
        .iter()
        .map(|cell| {
            cell.clone()
                .or_else(|| Some(Value::String(MISSING_PLACEHOLDER.to_string())))
        })
        .collect();
    Column::new(column.name.clone(), values)
}

fn format_column(column: &Column, template: &str, widen: bool) -> Result<Column, String> {
    let mut template = Template::parse(template)?;
    if widen {
        template = template.widen_integers();
    }
    let values = column
        .values
        .iter()
        .map(|cell| format_cell(cell, &template))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Column::new(column.name.clone(), values))
}

fn format_cell(cell: &Cell, template: &Template) -> Result<Cell, String> {
    let rendered = match cell {
        Some(value) => template.render(value)?,
        None => MISSING_PLACEHOLDER.to_string(),
    };
    Ok(Some(Value::String(rendered)))
}
