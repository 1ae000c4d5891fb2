//! Dictionary snapshot, validation and derived indexes.
//!
//! A [`Dictionary`] is an immutable, validated list of [`FieldDefinition`]s.
//! Row order is the canonical column order. Two indexes are derived whenever
//! a snapshot is built: `Name -> Format` for rows with a non-blank format,
//! and the ordered list of names.
//!
//! ## Validation rules
//!
//! - the columns `Data Set`, `Field`, `Name`, `Description`, `Type`, `Format`
//!   must be present (extra columns such as `Default Aggregation` are allowed)
//! - every `Type` must be one of [`FieldType::variants()`]
//! - `Name` is unique and non-blank
//! - `Data Set` + `Field` is unique whenever both are non-empty

use std::{
    collections::HashMap,
    fmt::Write as _,
    path::Path,
    sync::OnceLock,
};

use encoding_rs::Encoding;
use itertools::Itertools;
use log::{debug, warn};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{
    aggregation::Aggregation,
    error::{DataDictError, Result},
    field_type::FieldType,
    io_utils,
    table::Table,
    value::{Cell, Value},
};

pub const DATA_SET: &str = "Data Set";
pub const FIELD: &str = "Field";
pub const NAME: &str = "Name";
pub const DESCRIPTION: &str = "Description";
pub const TYPE: &str = "Type";
pub const FORMAT: &str = "Format";
pub const DEFAULT_AGGREGATION: &str = "Default Aggregation";

pub const REQUIRED_COLUMNS: [&str; 6] = [DATA_SET, FIELD, NAME, DESCRIPTION, TYPE, FORMAT];

/// Data set of the self-describing dictionary returned by [`meta()`].
pub const META_DATA_SET: &str = "data_dict";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub data_set: Option<String>,
    pub field: Option<String>,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "serialize_field_type")]
    pub field_type: FieldType,
    pub format: Option<String>,
    #[serde(serialize_with = "serialize_aggregation")]
    pub default_aggregation: Option<Aggregation>,
}

fn serialize_field_type<S: Serializer>(
    value: &FieldType,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_str())
}

fn serialize_aggregation<S: Serializer>(
    value: &Option<Aggregation>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(aggregation) => serializer.serialize_str(aggregation.key()),
        None => serializer.serialize_none(),
    }
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            data_set: None,
            field: None,
            name: name.into(),
            description: String::new(),
            field_type,
            format: None,
            default_aggregation: None,
        }
    }

    /// Maps `field` of `data_set` onto this definition's name.
    pub fn mapped_from(mut self, data_set: impl Into<String>, field: impl Into<String>) -> Self {
        self.data_set = non_blank(data_set.into());
        self.field = non_blank(field.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn formatted(mut self, format: impl Into<String>) -> Self {
        self.format = non_blank_template(format.into());
        self
    }

    pub fn aggregated(mut self, aggregation: Aggregation) -> Self {
        self.default_aggregation = Some(aggregation);
        self
    }

    /// `Data Set.Field`, present only when both parts are.
    pub fn field_id(&self) -> Option<String> {
        match (&self.data_set, &self.field) {
            (Some(data_set), Some(field)) => Some(format!("{data_set}.{field}")),
            _ => None,
        }
    }

    pub fn in_data_set(&self, data_set: &str) -> bool {
        self.data_set.as_deref().unwrap_or("") == data_set
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    definitions: Vec<FieldDefinition>,
    formats: HashMap<String, String>,
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Dictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates typed definitions and derives the indexes.
    pub fn new(definitions: Vec<FieldDefinition>) -> Result<Self> {
        ensure_names(&definitions)?;
        ensure_field_ids(&definitions)?;
        Ok(Self::from_validated(definitions))
    }

    fn from_validated(definitions: Vec<FieldDefinition>) -> Self {
        let formats = definitions
            .iter()
            .filter_map(|d| d.format.as_ref().map(|f| (d.name.clone(), f.clone())))
            .collect();
        let names = definitions.iter().map(|d| d.name.clone()).collect::<Vec<_>>();
        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(idx);
        }
        Self {
            definitions,
            formats,
            names,
            positions,
        }
    }

    /// Validates a dictionary held as a table of text cells.
    pub fn from_table(table: &Table) -> Result<Self> {
        ensure_required_columns(table)?;

        let text_of = |column: &str, row: usize| -> String {
            table
                .cell(row, column)
                .and_then(Option::as_ref)
                .map(Value::as_display)
                .unwrap_or_default()
        };

        let mut unsupported = Vec::new();
        let mut definitions = Vec::with_capacity(table.row_count());
        for row in 0..table.row_count() {
            let type_token = text_of(TYPE, row);
            let field_type = match type_token.parse::<FieldType>() {
                Ok(ty) => ty,
                Err(_) => {
                    unsupported.push(type_token.trim().to_string());
                    continue;
                }
            };
            let name = text_of(NAME, row);
            let default_aggregation = if table.has_column(DEFAULT_AGGREGATION) {
                parse_aggregation_hint(&name, &text_of(DEFAULT_AGGREGATION, row))
            } else {
                None
            };
            definitions.push(FieldDefinition {
                data_set: non_blank(text_of(DATA_SET, row)),
                field: non_blank(text_of(FIELD, row)),
                name,
                description: text_of(DESCRIPTION, row),
                field_type,
                format: non_blank_template(text_of(FORMAT, row)),
                default_aggregation,
            });
        }

        if !unsupported.is_empty() {
            let unsupported = unsupported.into_iter().unique().map(quoted).join(", ");
            return Err(DataDictError::validation(format!(
                "The Type column contains the following unsupported types: [{unsupported}]. Only the following types are supported: [{}]",
                FieldType::variants().join(", ")
            )));
        }

        Self::new(definitions)
    }

    /// Reads, normalises and validates a dictionary file.
    ///
    /// Snake-case headers (`data_set`, `field`, ...) are renamed to the
    /// canonical ones through [`meta()`] before validation.
    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let raw = io_utils::read_table(path, delimiter, encoding)?;
        let canonical = meta().remap(&raw, Some(META_DATA_SET))?;
        debug!(
            "Read {} dictionary row(s) from {:?} with columns {:?}",
            canonical.row_count(),
            path,
            canonical.column_names()
        );
        Self::from_table(&canonical)
    }

    pub fn definitions(&self) -> &[FieldDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Names in canonical order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `Name -> Format` for every row with a non-blank format.
    pub fn formats(&self) -> &HashMap<String, String> {
        &self.formats
    }

    pub fn format_of(&self, name: &str) -> Option<&str> {
        self.formats.get(name).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn definition(&self, name: &str) -> Option<&FieldDefinition> {
        self.position(name).map(|idx| &self.definitions[idx])
    }

    /// SHA-256 of the definitions, identical for identical content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match serde_json::to_vec(&self.definitions) {
            Ok(bytes) => hasher.update(&bytes),
            Err(err) => {
                warn!("Hashing dictionary without serialized rows: {err}");
                for name in &self.names {
                    hasher.update(name.as_bytes());
                }
            }
        }
        let mut digest = String::with_capacity(64);
        for byte in hasher.finalize() {
            let _ = write!(digest, "{byte:02x}");
        }
        digest
    }

    /// The dictionary as a table with the canonical columns plus
    /// `Default Aggregation`. Blank entries are missing cells.
    pub fn to_table(&self) -> Table {
        let headers = REQUIRED_COLUMNS
            .iter()
            .copied()
            .chain([DEFAULT_AGGREGATION])
            .collect::<Vec<_>>();
        let rows = self
            .definitions
            .iter()
            .map(|d| {
                vec![
                    opt_text(d.data_set.as_deref()),
                    opt_text(d.field.as_deref()),
                    opt_text(Some(&d.name)),
                    opt_text(Some(&d.description)),
                    opt_text(Some(d.field_type.as_str())),
                    opt_text(d.format.as_deref()),
                    opt_text(d.default_aggregation.map(|a| a.key())),
                ]
            })
            .collect();
        Table::from_rows(&headers, rows)
    }

    /// `Name` and `Description` of the entries whose name is a column of
    /// `table`, in dictionary order.
    pub fn describe(&self, table: &Table) -> Table {
        let rows = self
            .definitions
            .iter()
            .filter(|d| table.has_column(&d.name))
            .map(|d| vec![opt_text(Some(&d.name)), opt_text(Some(&d.description))])
            .collect();
        Table::from_rows(&[NAME, DESCRIPTION], rows)
    }
}

/// Validates a dictionary table. An absent dictionary is always valid.
pub fn validate(table: Option<&Table>) -> Result<()> {
    match table {
        Some(table) => Dictionary::from_table(table).map(|_| ()),
        None => Ok(()),
    }
}

/// The dictionary describing the dictionary format itself. It maps the
/// snake-case column names of data set `data_dict` onto the canonical
/// dictionary headers.
pub fn meta() -> &'static Dictionary {
    static META: OnceLock<Dictionary> = OnceLock::new();
    META.get_or_init(|| {
        let entry = |field: &str, name: &str, description: &str| {
            FieldDefinition::new(name, FieldType::Str)
                .mapped_from(META_DATA_SET, field)
                .described(description)
                .formatted("{:s}")
        };
        Dictionary::from_validated(vec![
            entry(
                "data_set",
                DATA_SET,
                "Used when mapping in combination with Field to rename the column to Name.",
            ),
            entry("field", FIELD, "Column name of the table to map to Name."),
            entry(
                "name",
                NAME,
                "Column name that is unique throughout the data dictionary.",
            ),
            entry(
                "description",
                DESCRIPTION,
                "Description of the column. Shown alongside the table when it is displayed.",
            ),
            entry("type", TYPE, "Type the column values are converted to."),
            entry(
                "format",
                FORMAT,
                "Template used to render values for display, such as {:.0f}%.",
            ),
            entry(
                "default_aggregation",
                DEFAULT_AGGREGATION,
                "Reduction applied to the column when it is summarised, such as sum or mean.",
            ),
        ])
    })
}

fn ensure_required_columns(table: &Table) -> Result<()> {
    if REQUIRED_COLUMNS.iter().all(|c| table.has_column(c)) {
        return Ok(());
    }
    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| quoted(c.to_string()))
        .join(", ");
    Err(DataDictError::validation(format!(
        "The data dictionary must at least include the following column names: [{}]. Missing: [{missing}]",
        REQUIRED_COLUMNS.join(", ")
    )))
}

fn ensure_names(definitions: &[FieldDefinition]) -> Result<()> {
    let blank = definitions
        .iter()
        .enumerate()
        .filter(|(_, d)| d.name.trim().is_empty())
        .map(|(idx, _)| (idx + 1).to_string())
        .collect::<Vec<_>>();
    if !blank.is_empty() {
        return Err(DataDictError::validation(format!(
            "The Name column is blank in row(s) {}. Every entry needs a name.",
            blank.join(", ")
        )));
    }

    let duplicates = definitions
        .iter()
        .map(|d| d.name.as_str())
        .duplicates()
        .map(|name| quoted(name.to_string()))
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        return Err(DataDictError::validation(format!(
            "The Name column contains the following duplicates: [{}]. The names must be unique.",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

fn ensure_field_ids(definitions: &[FieldDefinition]) -> Result<()> {
    let duplicates = definitions
        .iter()
        .filter_map(FieldDefinition::field_id)
        .duplicates()
        .map(quoted)
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        return Err(DataDictError::validation(format!(
            "The combination of columns Data Set and Field contains the following duplicates: [{}]. The combination must be unique.",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

fn parse_aggregation_hint(name: &str, hint: &str) -> Option<Aggregation> {
    if hint.trim().is_empty() {
        return None;
    }
    match hint.parse::<Aggregation>() {
        Ok(aggregation) => Some(aggregation),
        Err(err) => {
            warn!("Ignoring default aggregation of '{name}': {err}");
            None
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Templates keep their surrounding whitespace.
fn non_blank_template(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

fn opt_text(value: Option<&str>) -> Cell {
    value.map(|v| Value::String(v.to_string()))
}

fn quoted(value: String) -> String {
    format!("'{value}'")
}
