//! Layered configuration: command-line flags, then `-S` overrides, then the
//! TOML config file, then defaults derived from the data directory.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;

pub use builder::build_config;
pub use models::AppConfig;
