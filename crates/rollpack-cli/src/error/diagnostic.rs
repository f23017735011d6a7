//! Conversion of CLI errors into miette reports.

use miette::Report;

use crate::error::CliError;

/// Convert a [`CliError`] into a report for `main`.
///
/// Library errors keep their own diagnostic code and help text.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundler(e) => Report::new(e),
        CliError::BundleFailed(failure) => {
            if failure.diagnostics.is_empty() {
                miette::miette!("{}", failure.message)
            } else {
                miette::miette!(
                    "{}\n\n{}",
                    failure.message,
                    failure.diagnostics.join("\n")
                )
            }
        }
        CliError::Config(msg) => miette::miette!(
            help = "Run `rollpack schema` to see every supported option.",
            "Configuration error: {}",
            msg
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollpack_bundler::BundleFailure;

    #[test]
    fn test_bundler_error_keeps_code() {
        let report = cli_error_to_miette(CliError::Bundler(
            rollpack_bundler::Error::MissingOption("tsConfig"),
        ));
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("MISSING_OPTION"));
    }

    #[test]
    fn test_bundle_failure_lists_diagnostics() {
        let failure = BundleFailure::new("Rolldown failed to build umd bundle")
            .with_diagnostics(vec!["Could not resolve './missing'".to_string()]);
        let report = cli_error_to_miette(CliError::BundleFailed(failure));
        let rendered = report.to_string();
        assert!(rendered.starts_with("Rolldown failed to build umd bundle"));
        assert!(rendered.contains("./missing"));
    }
}
