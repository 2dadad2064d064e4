//! Global config file source: $XDG_CONFIG_HOME/gatehouse/config.toml or ~/.config/gatehouse/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;

/// Path to the global config file, if a home directory can be resolved.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gatehouse").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global config file source to the builder if it exists.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path() else {
        return Ok(builder);
    };
    if path.exists() {
        builder = builder.add_source(File::from(path).required(false));
    } else {
        debug!(config_path = %path.display(), "No global configuration file");
    }
    Ok(builder)
}
