//! Command-line interface definition for rollpack.
//!
//! - `rollpack package` - bundle a library as ESM + UMD and update its manifest
//! - `rollpack schema` - print the JSON schema of `rollpack.json`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rollpack_bundler::ModuleFormat;

/// rollpack - package a JavaScript/TypeScript library for publishing
#[derive(Parser, Debug)]
#[command(
    name = "rollpack",
    version,
    about = "Package a library as ESM and UMD bundles",
    long_about = "rollpack bundles a library entry point into ECMAScript module and UMD\n\
                  bundles with Rolldown, then points the package manifest's main, module\n\
                  and typings fields at the generated files."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle a library and update its package manifest
    ///
    /// Options not given on the command line are read from rollpack.json
    /// and ROLLPACK_* environment variables.
    Package(PackageArgs),

    /// Print the JSON schema for rollpack.json
    Schema(SchemaArgs),
}

/// Arguments for the package command.
///
/// Every field is optional here; required options may also come from the
/// configuration file or the environment.
#[derive(Args, Debug, Default, Clone)]
pub struct PackageArgs {
    /// Library entry point (e.g. libs/ui/src/index.ts)
    #[arg(long, value_name = "FILE")]
    pub entry_file: Option<PathBuf>,

    /// Directory the bundles are written to
    #[arg(long, value_name = "DIR")]
    pub output_path: Option<PathBuf>,

    /// Package manifest to update (e.g. libs/ui/package.json)
    #[arg(long, value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// tsconfig used for path mapping
    #[arg(long, value_name = "FILE")]
    pub ts_config: Option<PathBuf>,

    /// Rebuild when sources change
    #[arg(short, long)]
    pub watch: bool,

    /// Module id to keep external (repeatable)
    #[arg(long, value_name = "ID")]
    pub external: Vec<String>,

    /// UMD global for an external, as id=Name (repeatable)
    #[arg(long = "global", value_name = "ID=NAME", value_parser = parse_global)]
    pub globals: Vec<(String, String)>,

    /// Extra output format (repeatable); esm and umd are always built
    #[arg(short, long = "format", value_name = "FORMAT")]
    pub formats: Vec<ModuleFormat>,

    /// Do not emit source maps
    #[arg(long)]
    pub no_source_map: bool,

    /// Project name; defaults to the manifest's directory name
    #[arg(long, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Workspace root; discovered from the current directory when omitted
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Configuration file (default: rollpack.json in the workspace root)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SchemaArgs {
    /// Write the schema to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Parse `id=Name` into an external id and a JavaScript identifier.
pub fn parse_global(s: &str) -> Result<(String, String), String> {
    let (id, name) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected id=Name, got '{}'", s))?;

    if id.is_empty() {
        return Err(format!("Missing module id in '{}'", s));
    }

    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
    if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return Err(format!(
            "Global name must be a JavaScript identifier: '{}'",
            name
        ));
    }

    Ok((id.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global() {
        assert_eq!(
            parse_global("react=React").unwrap(),
            ("react".to_string(), "React".to_string())
        );
        assert_eq!(
            parse_global("@acme/util=$acme").unwrap(),
            ("@acme/util".to_string(), "$acme".to_string())
        );
        assert!(parse_global("react").is_err());
        assert!(parse_global("=React").is_err());
        assert!(parse_global("react=").is_err());
        assert!(parse_global("react=my-lib").is_err());
        assert!(parse_global("react=1React").is_err());
    }

    #[test]
    fn test_package_args() {
        let cli = Cli::parse_from([
            "rollpack",
            "package",
            "--entry-file",
            "libs/ui/src/index.ts",
            "--output-path",
            "dist/ui",
            "--external",
            "react",
            "--external",
            "react-dom",
            "--global",
            "react=React",
            "--format",
            "cjs",
            "--no-source-map",
            "-v",
        ]);

        assert!(cli.verbose);
        let Command::Package(args) = cli.command else {
            panic!("expected package command");
        };
        assert_eq!(args.entry_file, Some(PathBuf::from("libs/ui/src/index.ts")));
        assert_eq!(args.external, vec!["react", "react-dom"]);
        assert_eq!(args.globals, vec![("react".to_string(), "React".to_string())]);
        assert_eq!(args.formats, vec![ModuleFormat::Cjs]);
        assert!(args.no_source_map);
        assert!(!args.watch);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["rollpack", "-v", "-q", "schema"]);
        assert!(result.is_err());
    }
}
