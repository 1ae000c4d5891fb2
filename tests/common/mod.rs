#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use datadict::{Table, value::text};
use tempfile::{TempDir, tempdir};

pub const DICTIONARY_HEADERS: [&str; 6] =
    ["Data Set", "Field", "Name", "Description", "Type", "Format"];

/// Five typed fields of `data_set_1`, in canonical order.
pub const SAMPLE_ENTRIES: [[&str; 6]; 5] = [
    ["data_set_1", "field_1", "Name 1", "Description 1", "str", ""],
    ["data_set_1", "field_2", "Name 2", "Description 2", "int", "{:d}"],
    ["data_set_1", "field_3", "Name 3", "Description 3", "bool", "{:}"],
    ["data_set_1", "field_4", "Name 4", "Description 4", "float", "£{:.1f}m"],
    ["data_set_1", "field_5", "Name 5", "Description 5", "datetime64", ""],
];

pub const SAMPLE_DICTIONARY_CSV: &str = "\
Data Set,Field,Name,Description,Type,Format
data_set_1,field_1,Name 1,Description 1,str,
data_set_1,field_2,Name 2,Description 2,int,{:d}
data_set_1,field_3,Name 3,Description 3,bool,{:}
data_set_1,field_4,Name 4,Description 4,float,£{:.1f}m
data_set_2,field_1,Name 21,Description 1,str,
,,Name 22,Description 2,int,{:d}
";

pub const SAMPLE_DATA_CSV: &str = "\
field_1,field_2,field_3,field_4,field_5,field_6
test 1,1,True,1.1,2019-01-01,bayern
test 2,2,FALSE,1.2,2019-01-02,bayern
test 3,3,,,,bayern
";

/// A dictionary table of text cells with the six required columns.
pub fn dictionary_table(entries: &[[&str; 6]]) -> Table {
    let rows = entries
        .iter()
        .map(|entry| entry.iter().map(|cell| text(cell)).collect())
        .collect();
    Table::from_rows(&DICTIONARY_HEADERS[..], rows)
}

pub fn sample_dictionary() -> Table {
    dictionary_table(&SAMPLE_ENTRIES)
}

/// The raw rows of [`SAMPLE_DATA_CSV`] as read from a file.
pub fn sample_data() -> Table {
    raw_table(
        &["field_1", "field_2", "field_3", "field_4", "field_5", "field_6"],
        &[
            &["test 1", "1", "True", "1.1", "2019-01-01", "bayern"],
            &["test 2", "2", "FALSE", "1.2", "2019-01-02", "bayern"],
            &["test 3", "3", "", "", "", "bayern"],
        ],
    )
}

pub fn raw_table(headers: &[&str], rows: &[&[&str]]) -> Table {
    let records = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    Table::from_string_records(headers, records)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
