//! Plain-text rendering of tables for the terminal.

use std::{borrow::Cow, fmt::Write as _};

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Right,
}

/// Renders the table with its key levels as leading columns. Columns whose
/// cells all read as numbers are right aligned.
pub fn render_table(table: &Table) -> String {
    let (headers, rows) = table.to_display_rows();
    render_rows(&headers, &rows)
}

pub fn print_table(table: &Table) {
    print!("{}", render_table(table));
}

pub fn render_rows(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    let widths = widths.into_iter().map(|w| w.max(1)).collect::<Vec<_>>();
    let alignments = (0..column_count)
        .map(|idx| column_alignment(rows, idx))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let left = vec![Alignment::Left; column_count];
    let _ = writeln!(output, "{}", format_row(headers, &widths, &left));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths, &left));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &alignments));
    }
    output
}

/// `"[title ]{shown} out of {total} rows x {columns} columns"`, where the
/// `out of` part only appears when fewer or more rows are shown than the
/// source has.
pub fn footer(title: Option<&str>, shown: usize, total: usize, columns: usize) -> String {
    let mut line = String::new();
    if let Some(title) = title {
        let _ = write!(line, "{title} ");
    }
    if shown != total {
        let _ = write!(line, "{shown} out of ");
    }
    let _ = write!(line, "{total} rows x {columns} columns");
    line
}

fn column_alignment(rows: &[Vec<String>], idx: usize) -> Alignment {
    let mut cells = rows
        .iter()
        .filter_map(|row| row.get(idx))
        .filter(|cell| !cell.is_empty() && cell.as_str() != "-")
        .peekable();
    if cells.peek().is_some() && cells.all(|cell| cell.replace(',', "").parse::<f64>().is_ok()) {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Alignment]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .zip(alignments)
        .map(|((value, width), alignment)| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match alignment {
                Alignment::Left => format!("{sanitized}{padding}"),
                Alignment::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape sequence such as \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
