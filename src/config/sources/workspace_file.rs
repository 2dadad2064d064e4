//! Workspace config file source: config/config.toml, then config/{GATEHOUSE_ENV}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable selecting the environment-specific file.
pub const ENV_SELECTOR: &str = "GATEHOUSE_ENV";

const DEFAULT_ENVIRONMENT: &str = "development";

/// Site environment named by `GATEHOUSE_ENV`; blank values fall back to the default.
pub fn active_environment() -> String {
    std::env::var(ENV_SELECTOR)
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Workspace config files that exist, lowest precedence first.
pub fn workspace_config_files(workspace_root: &Path, environment: &str) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", environment)),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

/// Add the workspace's config files to the builder.
pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let environment = active_environment();
    let files = workspace_config_files(workspace_root, &environment);
    if files.is_empty() {
        debug!(
            workspace = %workspace_root.display(),
            environment = %environment,
            "No workspace configuration files"
        );
    }
    for path in files {
        debug!(config_path = %path.display(), environment = %environment, "Layering workspace configuration");
        builder = builder.add_source(File::from(path).required(false));
    }
    Ok(builder)
}
