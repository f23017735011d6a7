//! rollpack CLI entry point.

use clap::Parser;
use miette::Result;
use rollpack_cli::{cli, commands, error, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);

    let result = match args.command {
        cli::Command::Package(package_args) => commands::package_execute(package_args).await,
        cli::Command::Schema(schema_args) => commands::schema_execute(schema_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
