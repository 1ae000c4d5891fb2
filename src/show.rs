//! Terminal display of a data file through the dictionary.
//!
//! The input is remapped, optionally summarised, cut to the first rows,
//! formatted and printed with a footer and, on request, the descriptions of
//! the displayed columns.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::ShowArgs,
    datadict::DataDict,
    io_utils,
    remap::RemapOptions,
    render,
};

pub fn execute(args: &ShowArgs) -> Result<()> {
    let dict_path = &args.dictionary.dict;
    let mut data_dict = DataDict::new(args.dictionary.options())
        .with_context(|| format!("Loading data dictionary from {dict_path:?}"))?;

    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.input_delimiter);
    let mut raw = io_utils::read_table(&args.input, delimiter, encoding)
        .with_context(|| format!("Reading input file {:?}", args.input))?;
    if !args.key.is_empty() {
        raw = raw
            .set_key(args.key.as_slice())
            .with_context(|| format!("Keying rows of {:?} by {:?}", args.input, args.key))?;
    }
    info!(
        "Read {} row(s) x {} column(s) from {:?}",
        raw.row_count(),
        raw.column_count(),
        args.input
    );

    let options = RemapOptions {
        ensure_cols: args.ensure_cols,
        strip_cols: args.strip_cols,
    };
    let table = data_dict
        .remap_with(&raw, args.data_set.as_deref(), options)
        .with_context(|| format!("Remapping {:?}", args.input))?;
    debug!("Remapped columns: {:?}", table.column_names());

    let mut shown = if args.stats {
        data_dict.add_stats(&table)?
    } else {
        table.clone()
    };
    shown = shown.head(args.head);

    let (formatted, warnings) = data_dict.format_with_warnings(&shown)?;
    for warning in &warnings {
        debug!("Column '{}' shown unformatted", warning.column);
    }

    render::print_table(&formatted);
    println!(
        "{}",
        render::footer(
            args.title.as_deref(),
            shown.row_count(),
            table.row_count(),
            table.column_count()
        )
    );

    if args.describe {
        let descriptions = data_dict.describe(&shown)?;
        if descriptions.row_count() > 0 {
            println!();
            let (headers, rows) = descriptions.to_display_rows();
            // skip the positional key level
            let headers = headers.into_iter().skip(1).collect::<Vec<_>>();
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().skip(1).collect())
                .collect::<Vec<_>>();
            print!("{}", render::render_rows(&headers, &rows));
        }
    }

    if let Some(output) = &args.output {
        io_utils::write_table(&formatted, Some(output), b',')
            .with_context(|| format!("Writing formatted rows to {output:?}"))?;
        info!("Wrote {} formatted row(s) to {:?}", formatted.row_count(), output);
    }
    Ok(())
}
