//! `rollpack schema`: JSON schema of the package options.

use rollpack_bundler::BundleOptions;

use crate::cli::SchemaArgs;
use crate::error::Result;
use crate::ui;

/// Print the schema, or write it to `--output`.
pub async fn execute(args: SchemaArgs) -> Result<()> {
    let schema = BundleOptions::json_schema()?;
    let mut json = serde_json::to_string_pretty(&schema).map_err(rollpack_bundler::Error::from)?;
    json.push('\n');

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            ui::success(&format!("Schema written to {}", path.display()));
        }
        None => print!("{}", json),
    }

    Ok(())
}
