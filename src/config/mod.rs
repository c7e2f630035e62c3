// src/config/mod.rs

//! Configuration loading and validation for taskgate.
//!
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate scheduler limits and seed task declarations (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_from_path, parse_config,
};
pub use model::{ConfigFile, RawConfigFile, SchedulerSection, StoreSection, TaskConfig};
