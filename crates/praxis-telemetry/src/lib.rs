//! Observability for the Praxis action pipeline.
//!
//! - **Logging**: a `tracing-subscriber` registry with JSON or pretty output
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//! - **Diagnostics**: listeners that turn pipeline events into log lines
//!   ([`TracingListener`]) and metrics ([`MetricsListener`])
//!
//! # Example
//!
//! ```rust,ignore
//! use praxis_telemetry::{init_telemetry, MetricsListener, TelemetryConfig};
//! use std::sync::Arc;
//!
//! init_telemetry(&TelemetryConfig::builder().service_name("orders").build())?;
//!
//! let pipeline = ActionPipeline::builder(action)
//!     .listener(Arc::new(MetricsListener))
//!     .build();
//! ```
//!
//! # Metrics Endpoint
//!
//! [`render_metrics`] returns the Prometheus text format for a scrape
//! handler to serve:
//!
//! ```text
//! # TYPE praxis_actions_total counter
//! praxis_actions_total{action="/Orders",status="completed"} 1234
//! praxis_actions_total{action="/Orders",status="faulted"} 3
//! ```

#![doc(html_root_url = "https://docs.rs/praxis-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use listener::{MetricsListener, TracingListener};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
