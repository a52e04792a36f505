//! File-based loading through `ConfigLoader`.

use std::io::Write;

use praxis_config::{ConfigError, ConfigLoader, LogFormat};
use tempfile::{Builder, TempDir};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_toml_then_json_layers() {
    let dir = TempDir::new().unwrap();
    let base = write(
        &dir,
        "praxis.toml",
        r#"
        [selection]
        handler_key = "op"

        [telemetry.logging]
        level = "debug"
        "#,
    );
    let local = write(
        &dir,
        "praxis.local.json",
        r#"{ "telemetry": { "logging": { "format": "pretty" } } }"#,
    );

    let config = ConfigLoader::new()
        .with_file(&base)
        .unwrap()
        .with_file(&local)
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.selection.handler_key, "op");
    assert_eq!(config.telemetry.logging.level, "debug");
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = ConfigLoader::new().with_file(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

#[test]
fn test_optional_file_skipped_when_missing() {
    let dir = TempDir::new().unwrap();
    let config = ConfigLoader::new()
        .with_production()
        .with_optional_file(dir.path().join("absent.toml"))
        .unwrap()
        .load()
        .unwrap();
    assert_eq!(config.telemetry.logging.format, LogFormat::Json);
}

#[test]
fn test_optional_file_loaded_when_present() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "praxis.toml", "[pipeline]\nlog_arguments = true\n");
    let config = ConfigLoader::new()
        .with_optional_file(&path)
        .unwrap()
        .load()
        .unwrap();
    assert!(config.pipeline.log_arguments);
}

#[test]
fn test_unknown_field_in_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "praxis.toml", "[selection]\nhandler = \"op\"\n");
    let result = ConfigLoader::new().with_file(&path);
    assert!(result.is_err());
}

#[test]
fn test_unsupported_extension() {
    let file = Builder::new().suffix(".yaml").tempfile().unwrap();
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_validation_runs_on_load() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "praxis.toml",
        "[telemetry.metrics]\nduration_buckets = [1.0, 0.5]\n",
    );

    let loader = ConfigLoader::new().with_file(&path).unwrap();
    assert!(matches!(loader.load(), Err(ConfigError::InvalidValue { .. })));

    let unvalidated = ConfigLoader::new()
        .with_file(&path)
        .unwrap()
        .load_unvalidated()
        .unwrap();
    assert_eq!(unvalidated.telemetry.metrics.duration_buckets, vec![1.0, 0.5]);
}
