//! notes-cli library: command logic behind the `notes` binary.
//!
//! Exposed as a library so integration tests can drive the commands against
//! a fake backend.

pub mod commands;
pub mod config;
pub mod render;

pub use commands::{LocalFile, SaveRequest};
pub use config::{CliConfig, ConfigError, Overrides};
