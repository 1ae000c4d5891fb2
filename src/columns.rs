//! Listing of dictionary entries.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ColumnsArgs, datadict::DataDict, render};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let path = &args.dictionary.dict;
    let mut data_dict = DataDict::new(args.dictionary.options())
        .with_context(|| format!("Loading data dictionary from {path:?}"))?;
    let view = data_dict
        .filtered_view(args.data_set.as_deref(), args.any)
        .with_context(|| format!("Selecting entries of {path:?}"))?;

    if view.is_empty() {
        info!("Data dictionary {:?} has no matching entries", path);
        return Ok(());
    }

    let headers = ["#", "data set", "field", "name", "type", "format", "aggregation"]
        .map(String::from)
        .to_vec();
    let rows = view
        .iter()
        .enumerate()
        .map(|(idx, definition)| {
            vec![
                (idx + 1).to_string(),
                definition.data_set.clone().unwrap_or_default(),
                definition.field.clone().unwrap_or_default(),
                definition.name.clone(),
                definition.field_type.to_string(),
                definition.format.clone().unwrap_or_default(),
                definition
                    .default_aggregation
                    .map(|a| a.key().to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    print!("{}", render::render_rows(&headers, &rows));
    info!("Listed {} entries from {:?}", rows.len(), path);
    Ok(())
}
