//! Metadata-driven column mapping for tabular data.
//!
//! A data dictionary lists, per source data set, how raw column names
//! (`Field`) map onto canonical names (`Name`), which type each column holds
//! and how its values are displayed. [`DataDict`] validates such a dictionary
//! and uses it to remap, reorder, summarise and format [`Table`]s.

pub mod aggregation;
pub mod cli;
pub mod columns;
pub mod datadict;
pub mod dictionary;
pub mod error;
pub mod field_type;
pub mod format;
pub mod io_utils;
pub mod remap;
pub mod render;
pub mod show;
pub mod stats;
pub mod table;
pub mod template;
pub mod validate_cmd;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

pub use crate::{
    aggregation::Aggregation,
    datadict::{DataDict, DataDictOptions},
    dictionary::{Dictionary, FieldDefinition, meta, validate},
    error::DataDictError,
    field_type::FieldType,
    format::FormatWarning,
    remap::{DataSetView, RemapOptions},
    stats::{add_stats, has_stats},
    table::{Column, StatsAnnotation, Table},
    value::{Cell, Value},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("datadict", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => {
            info!("Validating {} data dictionary file(s)", args.files.len());
            validate_cmd::execute(&args)
        }
        Commands::Columns(args) => columns::execute(&args),
        Commands::Show(args) => show::execute(&args),
    }
}
