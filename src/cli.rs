//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    format_config_toml, format_simulation_json, format_simulation_text, format_validation_result,
};
pub use route::{command_name, RunContext};
