use crate::errors::{MediaRankError, Result};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Logger utility for the application
pub struct Logger;

impl Logger {
    /// Initialize the logger from a `-v` count: error, info, then debug
    pub fn init(verbosity: u8) -> Result<()> {
        let level = match verbosity {
            0 => Level::ERROR,
            1 => Level::INFO,
            _ => Level::DEBUG,
        };
        Self::init_with_level(level)
    }

    /// Initialize the logger with specified level; `RUST_LOG` takes precedence
    pub fn init_with_level(level: Level) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

        // stderr keeps stdout free for tables and JSON
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| MediaRankError::Config(format!("Failed to initialize logger: {}", e)))
    }

    /// Log operation start
    pub fn log_operation_start(operation: &str) {
        info!("Starting operation: {}", operation);
    }

    /// Log operation completion
    pub fn log_operation_complete(operation: &str) {
        info!("Completed operation: {}", operation);
    }

    /// Log configuration loaded
    pub fn log_config_loaded(path: &str) {
        info!("Configuration loaded from: {}", path);
    }

    /// Log configuration saved
    pub fn log_config_saved(path: &str) {
        info!("Configuration saved to: {}", path);
    }

    /// Log API request
    pub fn log_api_request(method: &str, target: &str) {
        debug!("API Request: {} {}", method, target);
    }

    /// Log API response
    pub fn log_api_response(status: u16, target: &str) {
        debug!("API Response: {} {}", status, target);
    }

    /// Log API error
    pub fn log_api_error(error: &str, target: &str) {
        warn!("API Error: {} - URL: {}", error, target);
    }
}
