//! Typed configuration for the Praxis action pipeline.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (preset → files → env)
//!
//! The loaded [`PraxisConfig`] knows how to turn itself into the pieces the
//! rest of the workspace consumes: [`PraxisConfig::telemetry_config`] for
//! `praxis_telemetry::init_telemetry` and
//! [`PraxisConfig::configure_pipeline`] for an `ActionPipelineBuilder`.
//!
//! # Example
//!
//! ```no_run
//! use praxis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), praxis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("praxis.toml")?
//!     .with_env_prefix("PRAXIS")
//!     .load()?;
//!
//! println!("handlers are selected by ?{}=", config.selection.handler_key);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [pipeline]
//! log_arguments = false
//! diagnostics = true
//!
//! [selection]
//! handler_key = "handler"
//! head_falls_back_to_get = true
//!
//! [telemetry]
//! service_name = "orders"
//!
//! [telemetry.logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//!
//! [telemetry.metrics]
//! enabled = true
//! duration_buckets = [0.001, 0.01, 0.1, 1.0]
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `PRAXIS__SELECTION__HANDLER_KEY=op`
//! - `PRAXIS__TELEMETRY__LOGGING__LEVEL=debug`
//! - `PRAXIS__TELEMETRY__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod convert;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PraxisConfig::default();
        assert!(!config.pipeline.log_arguments);
        assert!(config.pipeline.diagnostics);
        assert_eq!(config.telemetry.service_name, "praxis");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_format_example_parses() {
        let toml = r#"
            [pipeline]
            log_arguments = false
            diagnostics = true

            [selection]
            handler_key = "handler"
            head_falls_back_to_get = true

            [telemetry]
            service_name = "orders"

            [telemetry.logging]
            enabled = true
            level = "info"
            format = "json"
            include_location = false

            [telemetry.metrics]
            enabled = true
            duration_buckets = [0.001, 0.01, 0.1, 1.0]
        "#;

        let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();
        assert_eq!(config.telemetry.service_name, "orders");
        assert_eq!(config.telemetry.metrics.duration_buckets.len(), 4);
    }
}
