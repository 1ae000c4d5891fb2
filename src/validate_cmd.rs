use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ValidateArgs,
    datadict::{DataDict, DataDictOptions},
};

pub fn execute(args: &ValidateArgs) -> Result<()> {
    for file in &args.files {
        let data_dict = DataDict::new(DataDictOptions {
            file: Some(file.clone()),
            auto_reload: false,
            delimiter: args.delimiter,
            encoding: args.dict_encoding.clone(),
            ..DataDictOptions::default()
        })
        .with_context(|| format!("Validating data dictionary {file:?}"))?;
        let snapshot = data_dict.snapshot();
        info!(
            "✓ {:?} is a valid data dictionary ({} entries, fingerprint {})",
            file,
            snapshot.len(),
            &data_dict.fingerprint()[..12]
        );
    }
    Ok(())
}
