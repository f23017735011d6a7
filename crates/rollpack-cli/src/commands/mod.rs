//! Command implementations for the rollpack CLI.
//!
//! - [`package`] - bundle a library and update its manifest
//! - [`schema`] - print the options JSON schema

pub mod package;
pub mod schema;

pub use package::execute as package_execute;
pub use schema::execute as schema_execute;
