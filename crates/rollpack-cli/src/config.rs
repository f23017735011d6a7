//! Layered loading of [`BundleOptions`].
//!
//! Priority: CLI > Environment > File > Defaults

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
    value::Uncased,
};
use rollpack_bundler::{BundleOptions, ModuleFormat};
use serde::Serialize;

use crate::cli::PackageArgs;
use crate::error::{CliError, Result};

/// Configuration file looked up in the workspace root.
pub const CONFIG_FILE: &str = "rollpack.json";

/// Environment variable prefix (`ROLLPACK_ENTRY_FILE`, `ROLLPACK_WATCH`, ...).
pub const ENV_PREFIX: &str = "ROLLPACK_";

/// Fields set on the command line; unset ones stay out of the figment so
/// they don't mask lower layers.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    entry_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts_config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    watch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    globals: Option<std::collections::BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formats: Option<Vec<ModuleFormat>>,
}

impl From<&PackageArgs> for CliOverrides {
    fn from(args: &PackageArgs) -> Self {
        Self {
            entry_file: args.entry_file.clone(),
            output_path: args.output_path.clone(),
            project: args.project.clone(),
            ts_config: args.ts_config.clone(),
            watch: args.watch.then_some(true),
            external: (!args.external.is_empty()).then(|| args.external.clone()),
            project_name: args.project_name.clone(),
            globals: (!args.globals.is_empty()).then(|| args.globals.iter().cloned().collect()),
            source_map: args.no_source_map.then_some(false),
            formats: (!args.formats.is_empty()).then(|| args.formats.clone()),
        }
    }
}

/// Load options for `rollpack package`.
///
/// An explicit `--config` file must exist; the default `rollpack.json` in
/// `root` is optional.
pub fn load_options(args: &PackageArgs, root: &Path) -> Result<BundleOptions> {
    let mut figment = Figment::new().merge(Serialized::defaults(BundleOptions::default()));

    let config_file = match &args.config {
        Some(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            if !path.is_file() {
                return Err(CliError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            Some(path)
        }
        None => Some(root.join(CONFIG_FILE)).filter(|path| path.is_file()),
    };

    if let Some(path) = &config_file {
        tracing::debug!(config = %path.display(), "Loading configuration file");
        figment = figment.merge(Json::file(path));
    }

    figment = figment.merge(env_provider());
    figment = figment.merge(Serialized::defaults(CliOverrides::from(args)));

    figment.extract().map_err(|e| {
        CliError::Config(format!(
            "{} (check {} and {}* variables)",
            e, CONFIG_FILE, ENV_PREFIX
        ))
    })
}

/// `ROLLPACK_ENTRY_FILE` → `entryFile`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .map(|key| Uncased::from(to_camel_case(key.as_str())))
        .lowercase(false)
}

fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;

    for c in key.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args() -> PackageArgs {
        PackageArgs::default()
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("ENTRY_FILE"), "entryFile");
        assert_eq!(to_camel_case("WATCH"), "watch");
        assert_eq!(to_camel_case("ts_config"), "tsConfig");
        assert_eq!(to_camel_case("SOURCE_MAP"), "sourceMap");
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        Jail::expect_with(|jail| {
            let options = load_options(&args(), jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(options, BundleOptions::default());
            assert!(options.source_map);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_then_cli() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"{
                    "entryFile": "libs/ui/src/index.ts",
                    "outputPath": "dist/from-file",
                    "project": "libs/ui/package.json",
                    "tsConfig": "libs/ui/tsconfig.json",
                    "globals": { "react": "React" }
                }"#,
            )?;
            jail.set_env("ROLLPACK_OUTPUT_PATH", "dist/from-env");
            jail.set_env("ROLLPACK_PROJECT_NAME", "ui");

            let mut cli = args();
            cli.project_name = Some("ui-kit".to_string());
            cli.no_source_map = true;

            let options = load_options(&cli, jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(options.entry_file, PathBuf::from("libs/ui/src/index.ts"));
            assert_eq!(options.output_path, PathBuf::from("dist/from-env"));
            assert_eq!(options.project_name.as_deref(), Some("ui-kit"));
            assert_eq!(options.globals.get("react").map(String::as_str), Some("React"));
            assert!(!options.source_map);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_file_field_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, r#"{ "entry": "src/index.ts" }"#)?;
            let result = load_options(&args(), jail.directory());
            assert!(matches!(result, Err(CliError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_must_exist() {
        Jail::expect_with(|jail| {
            let mut cli = args();
            cli.config = Some(PathBuf::from("missing.json"));
            let result = load_options(&cli, jail.directory());
            assert!(matches!(result, Err(CliError::Config(_))));
            Ok(())
        });
    }
}
