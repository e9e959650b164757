//! Subcommand implementations.

use std::path::Path;

use ragskills_config::SkillsConfig;

pub mod budget;
pub mod config_cmd;
pub mod fit;

/// Load from an explicit path, or the default location with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<SkillsConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => SkillsConfig::load_from(path),
        None => SkillsConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}
