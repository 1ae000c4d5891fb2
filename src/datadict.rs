//! The [`DataDict`] facade: a dictionary snapshot plus its backing file.
//!
//! Every operation first checks whether the backing file changed since it was
//! last read (when auto-reload is on). A changed file is read and validated
//! into a fresh [`Dictionary`] which then replaces the active one in a single
//! assignment. A failed reload leaves the previous snapshot in place and fails
//! the operation that triggered it.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    dictionary::{self, Dictionary},
    error::{DataDictError, Result},
    format::FormatWarning,
    io_utils,
    remap::{DataSetView, RemapOptions},
    stats,
    table::Table,
    value::Cell,
};

#[derive(Debug, Clone)]
pub struct DataDictOptions {
    /// Delimited file holding the dictionary.
    pub file: Option<PathBuf>,
    /// Dictionary given as an in-memory table of text cells.
    pub table: Option<Table>,
    /// Re-read `file` before each operation when its modification time changed.
    pub auto_reload: bool,
    /// Field delimiter of `file`. Defaults to tab for `.tsv`, comma otherwise.
    pub delimiter: Option<u8>,
    /// Encoding label of `file`, UTF-8 when unset.
    pub encoding: Option<String>,
}

impl Default for DataDictOptions {
    fn default() -> Self {
        Self {
            file: None,
            table: None,
            auto_reload: true,
            delimiter: None,
            encoding: None,
        }
    }
}

#[derive(Debug)]
pub struct DataDict {
    file: Option<PathBuf>,
    auto_reload: bool,
    delimiter: u8,
    encoding: &'static Encoding,
    last_modified: Option<SystemTime>,
    active: Arc<Dictionary>,
}

impl DataDict {
    /// Builds a dictionary from a file or a table, never both. With neither the
    /// dictionary starts empty.
    pub fn new(options: DataDictOptions) -> Result<Self> {
        let DataDictOptions {
            file,
            table,
            auto_reload,
            delimiter,
            encoding,
        } = options;

        if file.is_some() && table.is_some() {
            return Err(DataDictError::config(
                "Parameters file and table can't be assigned at the same time.",
            ));
        }
        let encoding = io_utils::resolve_encoding(encoding.as_deref())?;
        let delimiter = match &file {
            Some(path) => io_utils::resolve_input_delimiter(path, delimiter),
            None => delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
        };
        let active = match &table {
            Some(table) => Dictionary::from_table(table)?,
            None => Dictionary::empty(),
        };

        let mut data_dict = Self {
            file,
            auto_reload,
            delimiter,
            encoding,
            last_modified: None,
            active: Arc::new(active),
        };
        data_dict.reload_if_stale()?;
        Ok(data_dict)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(DataDictOptions {
            file: Some(path.into()),
            ..DataDictOptions::default()
        })
    }

    pub fn from_table(table: Table) -> Result<Self> {
        Self::new(DataDictOptions {
            table: Some(table),
            ..DataDictOptions::default()
        })
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn auto_reload(&self) -> bool {
        self.auto_reload
    }

    pub fn set_auto_reload(&mut self, auto_reload: bool) {
        self.auto_reload = auto_reload;
    }

    /// The active snapshot, without a reload check.
    pub fn snapshot(&self) -> Arc<Dictionary> {
        Arc::clone(&self.active)
    }

    pub fn fingerprint(&self) -> String {
        self.active.fingerprint()
    }

    /// The active snapshot after a reload check.
    pub fn dictionary(&mut self) -> Result<Arc<Dictionary>> {
        self.refresh()?;
        Ok(self.snapshot())
    }

    pub fn formats(&mut self) -> Result<&HashMap<String, String>> {
        self.refresh()?;
        Ok(self.active.formats())
    }

    pub fn names(&mut self) -> Result<&[String]> {
        self.refresh()?;
        Ok(self.active.names())
    }

    /// Re-reads the backing file regardless of its modification time.
    pub fn reload(&mut self) -> Result<()> {
        self.last_modified = None;
        self.reload_if_stale()
    }

    fn refresh(&mut self) -> Result<()> {
        if self.auto_reload {
            self.reload_if_stale()
        } else {
            Ok(())
        }
    }

    fn reload_if_stale(&mut self) -> Result<()> {
        let Some(path) = self.file.as_deref() else {
            return Ok(());
        };
        if !path.exists() {
            return Err(DataDictError::config(format!(
                "The data dictionary file {} does not exist.",
                path.display()
            )));
        }
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(|source| DataDictError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if self.last_modified == Some(modified) {
            debug!("Data dictionary {path:?} unchanged since last read");
            return Ok(());
        }

        let loaded = Dictionary::load(path, self.delimiter, self.encoding)?;
        if self.last_modified.is_some() && loaded.fingerprint() == self.active.fingerprint() {
            debug!("Data dictionary {path:?} touched without content changes");
        } else {
            info!(
                "Loaded data dictionary {:?} with {} entries",
                path,
                loaded.len()
            );
        }
        self.active = Arc::new(loaded);
        self.last_modified = Some(modified);
        Ok(())
    }

    pub fn filtered_view(
        &mut self,
        data_set: Option<&str>,
        any_data_set: bool,
    ) -> Result<DataSetView<'_>> {
        self.refresh()?;
        self.active.filtered_view(data_set, any_data_set)
    }

    pub fn remap(&mut self, table: &Table, data_set: Option<&str>) -> Result<Table> {
        self.refresh()?;
        self.active.remap(table, data_set)
    }

    pub fn remap_with(
        &mut self,
        table: &Table,
        data_set: Option<&str>,
        options: RemapOptions,
    ) -> Result<Table> {
        self.refresh()?;
        self.active.remap_with(table, data_set, options)
    }

    pub fn reorder(&mut self, table: &Table) -> Result<Table> {
        self.refresh()?;
        Ok(self.active.reorder(table))
    }

    pub fn ensure_cols(
        &mut self,
        table: &Table,
        cols: Option<&[&str]>,
        data_set: Option<&str>,
    ) -> Result<Table> {
        self.refresh()?;
        self.active.ensure_cols(table, cols, data_set)
    }

    pub fn strip_cols(
        &mut self,
        table: &Table,
        data_set: Option<&str>,
        any_data_set: bool,
    ) -> Result<Table> {
        self.refresh()?;
        self.active.strip_cols(table, data_set, any_data_set)
    }

    pub fn format(&mut self, table: &Table) -> Result<Table> {
        self.refresh()?;
        Ok(self.active.format(table))
    }

    pub fn format_with_warnings(&mut self, table: &Table) -> Result<(Table, Vec<FormatWarning>)> {
        self.refresh()?;
        Ok(self.active.format_with_warnings(table))
    }

    pub fn aggregate(&mut self, table: &Table) -> Result<Vec<(String, Cell)>> {
        self.refresh()?;
        Ok(self.active.aggregate(table))
    }

    pub fn describe(&mut self, table: &Table) -> Result<Table> {
        self.refresh()?;
        Ok(self.active.describe(table))
    }

    /// Prepends `Total` and `Average` rows, summarising numeric-typed
    /// columns even when all of their values are missing.
    pub fn add_stats(&mut self, table: &Table) -> Result<Table> {
        self.refresh()?;
        Ok(self.active.add_stats(table))
    }

    pub fn has_stats(table: &Table) -> bool {
        stats::has_stats(table)
    }

    pub fn validate(table: Option<&Table>) -> Result<()> {
        dictionary::validate(table)
    }
}
