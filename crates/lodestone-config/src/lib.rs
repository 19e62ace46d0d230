//! Configuration for lodestone tools.
//!
//! Settings persist to disk as RON, missing fields fall back to defaults, and
//! command-line flags override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{BakeConfig, Config, DebugConfig, DemoConfig, ScheduleConfig, default_config_dir};
pub use error::ConfigError;
