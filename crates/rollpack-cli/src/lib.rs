//! rollpack CLI - package a library as ESM and UMD bundles.
//!
//! - [`cli`] - clap definitions
//! - [`config`] - layered option loading (`rollpack.json`, `ROLLPACK_*`, flags)
//! - [`commands`] - `package` and `schema`
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] / [`ui`] - tracing subscriber and status lines

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
