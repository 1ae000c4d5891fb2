use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::datadict::DataDictOptions;

#[derive(Debug, Parser)]
#[command(author, version, about = "Map, type and format tabular data through a data dictionary", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate one or more data dictionary files
    Validate(ValidateArgs),
    /// List the entries of a data dictionary
    Columns(ColumnsArgs),
    /// Remap a CSV file through a data dictionary and print it formatted
    Show(ShowArgs),
}

/// How to read the dictionary file.
#[derive(Debug, Args)]
pub struct DictionaryArgs {
    /// Data dictionary file (CSV, or TSV by extension)
    #[arg(short = 'd', long = "dict")]
    pub dict: PathBuf,
    /// Read the dictionary once instead of checking it for changes
    #[arg(long = "no-reload")]
    pub no_reload: bool,
    /// Delimiter of the dictionary file (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the dictionary file (defaults to utf-8)
    #[arg(long = "dict-encoding")]
    pub dict_encoding: Option<String>,
}

impl DictionaryArgs {
    pub fn options(&self) -> DataDictOptions {
        DataDictOptions {
            file: Some(self.dict.clone()),
            table: None,
            auto_reload: !self.no_reload,
            delimiter: self.delimiter,
            encoding: self.dict_encoding.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Dictionary files to validate
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Delimiter of the dictionary files (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the dictionary files (defaults to utf-8)
    #[arg(long = "dict-encoding")]
    pub dict_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub dictionary: DictionaryArgs,
    /// Only list the entries of this data set. Without it, or `--any`, the
    /// entries that belong to no data set are listed
    #[arg(long = "data-set", conflicts_with = "any")]
    pub data_set: Option<String>,
    /// List the entries of every data set
    #[arg(long)]
    pub any: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub dictionary: DictionaryArgs,
    /// CSV file to display ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Delimiter of the input file (supports ',', 'tab', ';', '|')
    #[arg(long = "input-delimiter", value_parser = parse_delimiter)]
    pub input_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Data set whose fields the input columns are mapped from
    #[arg(long = "data-set")]
    pub data_set: Option<String>,
    /// Input columns used as the row key instead of the row position
    #[arg(short = 'k', long = "key", value_delimiter = ',')]
    pub key: Vec<String>,
    /// Append the data set's columns missing from the input
    #[arg(long = "ensure-cols")]
    pub ensure_cols: bool,
    /// Drop the columns that do not belong to the data set
    #[arg(long = "strip-cols")]
    pub strip_cols: bool,
    /// Prepend Total and Average rows
    #[arg(long)]
    pub stats: bool,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub head: usize,
    /// Title printed in front of the row count
    #[arg(long)]
    pub title: Option<String>,
    /// Print the name and description of every displayed column
    #[arg(long)]
    pub describe: bool,
    /// Also write the displayed rows, formatted, to this CSV file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
