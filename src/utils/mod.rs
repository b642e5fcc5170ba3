//! Configuration utilities

pub mod config;

pub use config::{ConfigError, ConfigResult, ConfigurationManager, EngineConfig, ValidationReport};
