//! Configuration loader with layered approach.
//!
//! Layers are kept as JSON documents and deep-merged in order, so a file
//! that sets only `[telemetry.logging] level` leaves every other value of
//! the earlier layers in place.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, LogFormat, PraxisConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "PRAXIS";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. A preset (defaults, development or production)
/// 2. Configuration files and strings (TOML or JSON), in the order added
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use praxis_config::ConfigLoader;
///
/// # fn main() -> Result<(), praxis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("praxis.toml")?
///     .with_env_prefix("PRAXIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    base: PraxisConfig,
    layers: Vec<Value>,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: PraxisConfig::default(),
            layers: Vec::new(),
            env_prefix: None,
        }
    }

    /// Start over from the default configuration values.
    #[must_use]
    pub fn with_defaults(self) -> Self {
        self.with_base(PraxisConfig::default())
    }

    /// Start over from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(self) -> Self {
        self.with_base(PraxisConfig::development())
    }

    /// Start over from the production preset.
    #[must_use]
    pub fn with_production(self) -> Self {
        self.with_base(PraxisConfig::production())
    }

    fn with_base(mut self, base: PraxisConfig) -> Self {
        self.base = base;
        self.layers.clear();
        self
    }

    /// Add a configuration file layer.
    ///
    /// The format is determined by the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read,
    /// is not valid TOML/JSON, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let format = match extension.as_deref() {
            Some(format @ ("toml" | "json")) => format.to_string(),
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration file format: {}",
                    path.display()
                )))
            }
        };

        self.with_string(&content, &format)
    }

    /// Add a configuration file layer if the file exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Add a configuration layer from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails, the layer names unknown
    /// fields, or `format` is neither "toml" nor "json".
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[selection]\nhandler_key = \"op\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.selection.handler_key, "op");
    /// assert!(config.selection.head_falls_back_to_get);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        // Surface unknown fields and type errors at the layer that has them.
        serde_json::from_value::<PraxisConfig>(layer.clone())?;

        self.layers.push(layer);
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `PRAXIS__SELECTION__HANDLER_KEY=op` or
    /// `PRAXIS__TELEMETRY__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge all layers, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if merging, environment parsing or validation
    /// fails.
    pub fn load(self) -> Result<PraxisConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), without the final validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if merging or environment parsing fails.
    pub fn load_unvalidated(self) -> Result<PraxisConfig, ConfigError> {
        let mut merged = serde_json::to_value(&self.base)?;
        for layer in self.layers {
            merge(&mut merged, layer);
        }
        let mut config: PraxisConfig = serde_json::from_value(merged)?;

        if let Some(prefix) = &self.env_prefix {
            let vars = env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
            apply_env_overrides(&mut config, prefix, vars)?;
        }

        Ok(config)
    }
}

/// Deep-merges `overlay` into `target`. Objects merge key by key; anything
/// else replaces.
fn merge(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, overlay) => *target = overlay,
    }
}

fn apply_env_overrides(
    config: &mut PraxisConfig,
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<(), ConfigError> {
    let prefix = format!("{prefix}__");
    for (key, value) in vars {
        if let Some(path) = key.strip_prefix(&prefix) {
            apply_env_var(config, &key, path, &value)?;
        }
    }
    Ok(())
}

fn apply_env_var(
    config: &mut PraxisConfig,
    key: &str,
    path: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let parts: Vec<&str> = path.split("__").collect();
    let boolean = || parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"));

    match parts.as_slice() {
        ["PIPELINE", "LOG_ARGUMENTS"] => config.pipeline.log_arguments = boolean()?,
        ["PIPELINE", "DIAGNOSTICS"] => config.pipeline.diagnostics = boolean()?,

        ["SELECTION", "HANDLER_KEY"] => config.selection.handler_key = value.to_string(),
        ["SELECTION", "HEAD_FALLS_BACK_TO_GET"] => {
            config.selection.head_falls_back_to_get = boolean()?;
        }

        ["TELEMETRY", "SERVICE_NAME"] => config.telemetry.service_name = value.to_string(),
        ["TELEMETRY", "LOGGING", "ENABLED"] => config.telemetry.logging.enabled = boolean()?,
        ["TELEMETRY", "LOGGING", "LEVEL"] => config.telemetry.logging.level = value.to_string(),
        ["TELEMETRY", "LOGGING", "FORMAT"] => {
            config.telemetry.logging.format = match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::env_parse_error(
                        key,
                        "expected 'json' or 'pretty'",
                    ))
                }
            };
        }
        ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
            config.telemetry.logging.include_location = boolean()?;
        }
        ["TELEMETRY", "METRICS", "ENABLED"] => config.telemetry.metrics.enabled = boolean()?,
        ["TELEMETRY", "METRICS", "DURATION_BUCKETS"] => {
            config.telemetry.metrics.duration_buckets = value
                .split(',')
                .map(|bucket| bucket.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| ConfigError::env_parse_error(key, "expected comma-separated numbers"))?;
        }

        // Unknown keys are ignored.
        _ => {}
    }

    Ok(())
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, PraxisConfig::default());
    }

    #[test]
    fn test_layers_deep_merge() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[telemetry.logging]\nformat = \"json\"", "toml")
            .unwrap()
            .with_string(r#"{"telemetry": {"service_name": "orders"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        // from the preset, untouched by either layer
        assert_eq!(config.telemetry.logging.level, "debug");
        assert!(config.pipeline.log_arguments);
        // from the layers
        assert_eq!(config.telemetry.logging.format, LogFormat::Json);
        assert_eq!(config.telemetry.service_name, "orders");
    }

    #[test]
    fn test_later_layer_wins() {
        let config = ConfigLoader::new()
            .with_string("[selection]\nhandler_key = \"a\"", "toml")
            .unwrap()
            .with_string("[selection]\nhandler_key = \"b\"", "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.selection.handler_key, "b");
    }

    #[test]
    fn test_preset_resets_layers() {
        let config = ConfigLoader::new()
            .with_string("[selection]\nhandler_key = \"op\"", "toml")
            .unwrap()
            .with_production()
            .load()
            .unwrap();
        assert_eq!(config.selection.handler_key, "handler");
    }

    #[test]
    fn test_unknown_field_rejected_at_layer() {
        let result = ConfigLoader::new().with_string("[pipeline]\nturbo = true", "toml");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: b", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ConfigLoader::new().with_string("[selection", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PraxisConfig::default();
        apply_env_overrides(
            &mut config,
            "PRAXIS",
            vars(&[
                ("PRAXIS__PIPELINE__LOG_ARGUMENTS", "yes"),
                ("PRAXIS__SELECTION__HANDLER_KEY", "op"),
                ("PRAXIS__TELEMETRY__LOGGING__FORMAT", "Pretty"),
                ("PRAXIS__TELEMETRY__METRICS__DURATION_BUCKETS", "0.01, 0.1, 1"),
                ("PRAXIS__NOT__A__KEY", "ignored"),
                ("PRAXISX__SELECTION__HANDLER_KEY", "other prefix"),
                ("HOME", "/root"),
            ]),
        )
        .unwrap();

        assert!(config.pipeline.log_arguments);
        assert_eq!(config.selection.handler_key, "op");
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert_eq!(config.telemetry.metrics.duration_buckets, vec![0.01, 0.1, 1.0]);
    }

    #[test]
    fn test_env_parse_errors() {
        let mut config = PraxisConfig::default();
        let err = apply_env_overrides(
            &mut config,
            "PRAXIS",
            vars(&[("PRAXIS__PIPELINE__DIAGNOSTICS", "maybe")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PRAXIS__PIPELINE__DIAGNOSTICS"));

        let err = apply_env_overrides(
            &mut config,
            "PRAXIS",
            vars(&[("PRAXIS__TELEMETRY__LOGGING__FORMAT", "xml")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_merge_replaces_non_objects() {
        let mut target = serde_json::json!({"a": {"b": 1, "c": [1, 2]}, "d": true});
        merge(&mut target, serde_json::json!({"a": {"c": [3]}, "d": null}));
        assert_eq!(target, serde_json::json!({"a": {"b": 1, "c": [3]}, "d": null}));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
