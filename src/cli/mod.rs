//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

use gatehop_core::config::TomlConfig;
use gatehop_core::error::Result;
use std::path::Path;

pub mod connect;
pub mod fetch;

/// Load configuration from an explicit path, or the default location
///
/// With no explicit path, a missing config file falls back to defaults; an
/// explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    match path {
        Some(path) => TomlConfig::from_file(path),
        None => TomlConfig::load_or_default(),
    }
}
