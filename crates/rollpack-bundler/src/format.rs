//! Module formats a package can be emitted in.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output module format.
///
/// ESM and UMD are always produced; further formats are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// ECMAScript module (`import`/`export`)
    Esm,
    /// Universal Module Definition (AMD, CommonJS and browser global)
    Umd,
    /// CommonJS (`require`/`module.exports`)
    Cjs,
}

impl ModuleFormat {
    /// Formats every package build includes, in emission order.
    pub const REQUIRED: [ModuleFormat; 2] = [ModuleFormat::Esm, ModuleFormat::Umd];

    /// Tag used in file names and logs.
    pub fn tag(self) -> &'static str {
        match self {
            ModuleFormat::Esm => "esm",
            ModuleFormat::Umd => "umd",
            ModuleFormat::Cjs => "cjs",
        }
    }

    /// File name suffix, e.g. `.esm.js`.
    pub fn suffix(self) -> &'static str {
        match self {
            ModuleFormat::Esm => ".esm.js",
            ModuleFormat::Umd => ".umd.js",
            ModuleFormat::Cjs => ".cjs.js",
        }
    }

    pub(crate) fn to_rolldown(self) -> rolldown::OutputFormat {
        match self {
            ModuleFormat::Esm => rolldown::OutputFormat::Esm,
            ModuleFormat::Umd => rolldown::OutputFormat::Umd,
            ModuleFormat::Cjs => rolldown::OutputFormat::Cjs,
        }
    }
}

impl std::fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ModuleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "esm" | "es" | "module" => Ok(ModuleFormat::Esm),
            "umd" => Ok(ModuleFormat::Umd),
            "cjs" | "commonjs" => Ok(ModuleFormat::Cjs),
            other => Err(format!("Unknown module format: {}", other)),
        }
    }
}

/// Required formats followed by any extra requested ones, without duplicates.
pub fn resolve_formats(requested: &[ModuleFormat]) -> Vec<ModuleFormat> {
    let mut formats = ModuleFormat::REQUIRED.to_vec();
    for format in requested {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }
    formats
}
