//! # tv-telemetry
//!
//! Logging bootstrap shared by the trajectory validation binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tv_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // tracing macros anywhere in the process now reach the console
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TV_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directive |
//! | `TV_JSON_LOGS` | `false` | JSON lines instead of pretty output |
//! | `TV_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `TV_SERVICE_NAME` | `trajectory-validation` | Service name |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, is_initialized};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Telemetry already initialized")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}

/// Initialize logging for the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}

/// Render every registered Prometheus metric in text exposition format.
#[cfg(feature = "metrics")]
pub fn gather_metrics() -> Result<String, TelemetryError> {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}
