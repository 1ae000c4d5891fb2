//! Delimited-file plumbing: delimiter and encoding resolution, reader and
//! writer construction, and loading a file into a raw text [`Table`].
//!
//! The `-` path reads standard input or writes standard output.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{
    error::{DataDictError, Result},
    table::Table,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| DataDictError::config(format!("Unknown encoding '{value}'"))),
        None => Ok(UTF_8),
    }
}

/// `.tsv` files are tab separated, everything else defaults to commas.
pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(path).map_err(|source| DataDictError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Box::new(BufReader::new(file))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => {
            let file = File::create(p).map_err(|source| DataDictError::Io {
                path: p.to_path_buf(),
                source,
            })?;
            Box::new(BufWriter::new(file))
        }
        _ => Box::new(io::stdout()),
    };
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(writer))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    (!had_errors).then(|| text.into_owned())
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a delimited file with a header row into a table of strings keyed by
/// row position. Empty fields stay empty strings.
pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let csv_error = |source| DataDictError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let decode_error = || DataDictError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name().to_string(),
    };

    let headers = reader.byte_headers().map_err(csv_error)?.clone();
    let headers = decode_record(&headers, encoding).ok_or_else(decode_error)?;

    let mut records = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(csv_error)?;
        records.push(decode_record(&record, encoding).ok_or_else(decode_error)?);
    }
    Ok(Table::from_string_records(&headers, records))
}

/// Writes the table, key levels first, with a header row.
pub fn write_table(table: &Table, path: Option<&Path>, delimiter: u8) -> Result<()> {
    let target = path.unwrap_or(Path::new("-")).to_path_buf();
    let csv_error = |source| DataDictError::Csv {
        path: target.clone(),
        source,
    };
    let mut writer = open_csv_writer(path, delimiter)?;
    let (headers, rows) = table.to_display_rows();
    writer.write_record(&headers).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| DataDictError::Io {
        path: target.clone(),
        source,
    })
}
