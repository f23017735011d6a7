//! Declarative options for one packaging invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::format::ModuleFormat;
use crate::{Error, Result};

/// Options for packaging a library.
///
/// Paths are relative to the project source root returned by the
/// [`ProjectGraph`](crate::ProjectGraph). The struct is created once per
/// invocation and never mutated by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleOptions {
    /// Library entry point (e.g. `libs/ui/src/index.ts`)
    #[serde(default)]
    pub entry_file: PathBuf,

    /// Directory the bundles are written to
    #[serde(default)]
    pub output_path: PathBuf,

    /// Path of the package manifest to update (e.g. `libs/ui/package.json`)
    #[serde(default)]
    pub project: PathBuf,

    /// TypeScript configuration used for path mapping
    #[serde(default)]
    pub ts_config: PathBuf,

    /// Rebuild whenever sources change
    #[serde(default)]
    pub watch: bool,

    /// Module ids that stay external in addition to the manifest's dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external: Vec<String>,

    /// Project identifier; defaults to the manifest's directory name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Global variable names for external ids in the UMD bundle
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub globals: BTreeMap<String, String>,

    /// Emit external source maps next to each bundle
    #[serde(default = "default_source_map")]
    pub source_map: bool,

    /// Extra formats; ESM and UMD are always emitted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<ModuleFormat>,
}

fn default_source_map() -> bool {
    true
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            entry_file: PathBuf::new(),
            output_path: PathBuf::new(),
            project: PathBuf::new(),
            ts_config: PathBuf::new(),
            watch: false,
            external: Vec::new(),
            project_name: None,
            globals: BTreeMap::new(),
            source_map: default_source_map(),
            formats: Vec::new(),
        }
    }
}

impl BundleOptions {
    /// Create options with the four required paths set.
    pub fn new(
        entry_file: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        project: impl Into<PathBuf>,
        ts_config: impl Into<PathBuf>,
    ) -> Self {
        Self {
            entry_file: entry_file.into(),
            output_path: output_path.into(),
            project: project.into(),
            ts_config: ts_config.into(),
            ..Self::default()
        }
    }

    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn external<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn global(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.globals.insert(id.into(), name.into());
        self
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    pub fn format(mut self, format: ModuleFormat) -> Self {
        if !self.formats.contains(&format) {
            self.formats.push(format);
        }
        self
    }

    /// Check that every required option is present.
    pub fn validate(&self) -> Result<()> {
        let required: [(&'static str, &Path); 4] = [
            ("entryFile", &self.entry_file),
            ("outputPath", &self.output_path),
            ("project", &self.project),
            ("tsConfig", &self.ts_config),
        ];

        for (field, path) in required {
            if path.as_os_str().is_empty() {
                return Err(Error::MissingOption(field));
            }
        }

        Ok(())
    }

    /// Project identifier: explicit name, else the manifest's directory name.
    pub fn resolved_project_name(&self) -> String {
        if let Some(name) = self.project_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        self.project
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .unwrap_or("default")
            .to_string()
    }

    /// JSON schema of the options object.
    pub fn json_schema() -> Result<serde_json::Value> {
        let schema = schemars::schema_for!(BundleOptions);
        Ok(serde_json::to_value(schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_options() -> BundleOptions {
        BundleOptions::new(
            "libs/ui/src/index.ts",
            "dist/ui",
            "libs/ui/package.json",
            "libs/ui/tsconfig.json",
        )
    }

    #[test]
    fn test_validate_accepts_required_paths() {
        assert!(ui_options().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let options = BundleOptions {
            ts_config: PathBuf::new(),
            ..ui_options()
        };
        assert!(matches!(
            options.validate(),
            Err(Error::MissingOption("tsConfig"))
        ));

        assert!(matches!(
            BundleOptions::default().validate(),
            Err(Error::MissingOption("entryFile"))
        ));
    }

    #[test]
    fn test_project_name_derived_from_manifest_dir() {
        assert_eq!(ui_options().resolved_project_name(), "ui");
        assert_eq!(
            ui_options().project_name("example").resolved_project_name(),
            "example"
        );
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: BundleOptions = serde_json::from_str(
            r#"{
                "entryFile": "libs/ui/src/index.ts",
                "outputPath": "dist/ui",
                "project": "libs/ui/package.json",
                "tsConfig": "libs/ui/tsconfig.json",
                "watch": true,
                "external": ["react"]
            }"#,
        )
        .unwrap();

        assert_eq!(options.entry_file, PathBuf::from("libs/ui/src/index.ts"));
        assert!(options.watch);
        assert!(options.source_map, "source maps default to on");
        assert_eq!(options.external, vec!["react".to_string()]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let parsed = serde_json::from_str::<BundleOptions>(r#"{ "entry": "src/index.ts" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = BundleOptions::json_schema().unwrap();
        let properties = schema.get("properties").expect("properties");
        assert!(properties.get("entryFile").is_some());
        assert!(properties.get("tsConfig").is_some());
    }
}
