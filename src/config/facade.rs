//! Config loader facade: builds the layered configuration.

use crate::config::merge::merge_policy;
use crate::config::sources::{env, global_file, workspace_file};
use crate::config::GatehouseConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<GatehouseConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load configuration from one explicit file, still honouring environment overrides.
    pub fn load_from_file(path: &Path) -> Result<GatehouseConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Path of the user-level configuration file, if resolvable.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
