//! TypeScript path mapping for module resolution.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::BundleFailure;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<PathBuf>,
    #[serde(default)]
    paths: Map<String, Value>,
}

/// Read `compilerOptions.paths` and turn them into resolver aliases.
///
/// Wildcard mappings (`@acme/*` → `libs/*`) become prefix aliases. Targets are
/// made absolute against `baseUrl`, or the tsconfig directory when unset.
///
/// A missing or unreadable tsconfig is a bundle failure. Content that is not
/// strict JSON (comments, trailing commas) only disables path mapping.
pub async fn read_path_aliases(
    ts_config: &Path,
) -> Result<Vec<(String, Vec<Option<String>>)>, BundleFailure> {
    let content = tokio::fs::read_to_string(ts_config).await.map_err(|e| {
        BundleFailure::new(format!(
            "Cannot read tsconfig {}: {}",
            ts_config.display(),
            e
        ))
    })?;

    let config: TsConfig = match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                tsconfig = %ts_config.display(),
                error = %e,
                "tsconfig is not plain JSON, path mapping disabled"
            );
            return Ok(Vec::new());
        }
    };

    let config_dir = ts_config.parent().unwrap_or_else(|| Path::new("."));
    Ok(aliases_from(&config, config_dir))
}

fn aliases_from(config: &TsConfig, config_dir: &Path) -> Vec<(String, Vec<Option<String>>)> {
    let base = match &config.compiler_options.base_url {
        Some(base_url) => config_dir.join(base_url).clean(),
        None => config_dir.to_path_buf(),
    };

    config
        .compiler_options
        .paths
        .iter()
        .map(|(pattern, targets)| {
            let key = pattern.trim_end_matches("/*").to_string();
            let targets = targets
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(|target| {
                    let target = target.trim_end_matches("/*");
                    Some(base.join(target).clean().to_string_lossy().into_owned())
                })
                .collect();
            (key, targets)
        })
        .collect()
}
