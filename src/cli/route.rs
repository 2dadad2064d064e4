//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_config_toml, format_simulation_json, format_simulation_text, format_validation_result,
};
use crate::config::{ConfigLoader, GatehouseConfig};
use crate::error::GatehouseError;
use crate::simulation::{run_simulation, SimulationPlan};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace, config path, and the loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: GatehouseConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, GatehouseError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self {
            workspace_root,
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, GatehouseError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        debug!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, GatehouseError> {
        match command {
            Commands::Config { command } => self.handle_config(command),
            Commands::Simulate {
                normal,
                high,
                urgent,
                duration_secs,
                tick_secs,
                fail_every,
                format,
            } => {
                let plan = SimulationPlan {
                    normal: *normal,
                    high: *high,
                    urgent: *urgent,
                    duration_secs: *duration_secs,
                    tick_secs: *tick_secs,
                    fail_every: *fail_every,
                };
                self.handle_simulate(&plan, format)
            }
        }
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, GatehouseError> {
        match command {
            ConfigCommands::Show => {
                let source = match &self.config_path {
                    Some(path) => format!("# source: {}", path.display()),
                    None => format!("# workspace: {}", self.workspace_root.display()),
                };
                Ok(format!("{}\n{}", source, format_config_toml(&self.config)?))
            }
            ConfigCommands::Validate => Ok(format_validation_result(&self.config.validate())),
        }
    }

    fn handle_simulate(&self, plan: &SimulationPlan, format: &str) -> Result<String, GatehouseError> {
        self.config.queue.validate().map_err(GatehouseError::ConfigError)?;
        info!(
            normal = plan.normal,
            high = plan.high,
            urgent = plan.urgent,
            duration_secs = plan.duration_secs,
            "Starting simulation"
        );
        let report = run_simulation(plan, &self.config.queue)?;
        match format {
            "json" => format_simulation_json(&report),
            "text" => Ok(format_simulation_text(&report)),
            other => Err(GatehouseError::ConfigError(format!(
                "Unknown output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// Stable command name for logging.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Config {
            command: ConfigCommands::Show,
        } => "config.show",
        Commands::Config {
            command: ConfigCommands::Validate,
        } => "config.validate",
        Commands::Simulate { .. } => "simulate",
    }
}
