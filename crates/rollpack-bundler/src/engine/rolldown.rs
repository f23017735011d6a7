//! Rolldown-backed bundling engine.

use std::path::Path;

use async_trait::async_trait;
use rolldown::{
    BundleOutput, BundlerBuilder, BundlerOptions, GlobalsOutputOption, InputItem, IsExternal,
    ResolveOptions, SourceMapType,
};
use rustc_hash::FxHashMap;

use super::output::{PendingFile, collect_files, commit_files};
use super::tsconfig::read_path_aliases;
use super::{BundleEngine, BundleFailure, BundleResult, EngineRequest};
use crate::format::ModuleFormat;
use crate::spec::BundleSpec;

type Aliases = Vec<(String, Vec<Option<String>>)>;

/// Bundles every requested format with Rolldown.
///
/// Formats are generated one after another in memory; nothing reaches the
/// disk unless all of them succeed. Cancelling a bundle during generation
/// leaves the disk untouched; once writing has begun it finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownEngine;

impl RolldownEngine {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, request: &EngineRequest) -> Result<(), BundleFailure> {
        let aliases = read_path_aliases(&request.ts_config).await?;

        let mut pending: Vec<PendingFile> = Vec::new();
        for spec in &request.specs {
            tracing::debug!(
                format = %spec.format,
                output = %spec.output_file.display(),
                "Generating bundle"
            );
            let output = generate(spec, request, &aliases).await?;
            pending.extend(collect_files(&output, spec.output_dir())?);
        }

        let written = commit_files(pending).await?;
        tracing::debug!(files = written, "Bundles written");
        Ok(())
    }
}

#[async_trait]
impl BundleEngine for RolldownEngine {
    async fn bundle(&self, request: &EngineRequest) -> BundleResult {
        if request.specs.is_empty() {
            return BundleResult::failure("No bundle specs requested");
        }

        match self.run(request).await {
            Ok(()) => BundleResult::Success,
            Err(failure) => BundleResult::Failure(failure),
        }
    }
}

async fn generate(
    spec: &BundleSpec,
    request: &EngineRequest,
    aliases: &Aliases,
) -> Result<BundleOutput, BundleFailure> {
    let options = configure_rolldown_options(spec, request, aliases);

    let mut bundler = BundlerBuilder::default()
        .with_options(options)
        .build()
        .map_err(|e| rolldown_failure(spec.format, &e))?;

    bundler
        .generate()
        .await
        .map_err(|e| rolldown_failure(spec.format, &e))
}

/// Translate one [`BundleSpec`] into Rolldown options.
///
/// The input is named after the output file so the entry chunk comes out as
/// `<stem>.<format>.js` under Rolldown's default `[name].js` pattern.
fn configure_rolldown_options(
    spec: &BundleSpec,
    request: &EngineRequest,
    aliases: &Aliases,
) -> BundlerOptions {
    let entry_name = spec
        .output_file_name()
        .strip_suffix(".js")
        .unwrap_or(spec.output_file_name())
        .to_string();

    let mut options = BundlerOptions {
        input: Some(vec![InputItem {
            name: Some(entry_name),
            import: spec.input.to_string_lossy().into_owned(),
        }]),
        cwd: Some(request.cwd.clone()),
        format: Some(spec.format.to_rolldown()),
        sourcemap: spec.sourcemap.then_some(SourceMapType::File),
        external: Some(IsExternal::from(spec.external.clone())),
        ..Default::default()
    };

    if spec.format == ModuleFormat::Umd {
        options.name = Some(spec.output_name.clone());

        if !request.globals.is_empty() {
            let globals: FxHashMap<String, String> = request
                .globals
                .iter()
                .map(|(id, name)| (id.clone(), name.clone()))
                .collect();
            options.globals = Some(GlobalsOutputOption::from(globals));
        }
    }

    options.resolve = Some(configure_resolution(&request.cwd, aliases));

    options
}

/// Resolution rooted at `cwd`: every ancestor `node_modules` is searched and
/// TypeScript sources resolve without extensions.
fn configure_resolution(cwd: &Path, aliases: &Aliases) -> ResolveOptions {
    let modules = cwd
        .ancestors()
        .map(|dir| dir.join("node_modules").to_string_lossy().into_owned())
        .collect();

    ResolveOptions {
        alias: (!aliases.is_empty()).then(|| aliases.clone()),
        main_fields: Some(vec![
            "browser".to_string(),
            "module".to_string(),
            "main".to_string(),
        ]),
        extensions: Some(vec![
            ".ts".to_string(),
            ".tsx".to_string(),
            ".mts".to_string(),
            ".js".to_string(),
            ".jsx".to_string(),
            ".mjs".to_string(),
            ".json".to_string(),
        ]),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}

/// Fold a Rolldown error into a failure, keeping each diagnostic line.
fn rolldown_failure(format: ModuleFormat, error: &dyn std::fmt::Debug) -> BundleFailure {
    let rendered = format!("{error:?}");
    let diagnostics = rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    BundleFailure::new(format!("Rolldown failed to build {} bundle", format))
        .with_diagnostics(diagnostics)
}
