// Configuration module entry point
// Loads layered configuration and holds the shared per-server state

mod state;
mod types;

use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::ServerError;

pub use state::AppState;
pub use types::{
    Config, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig, DEFAULT_PORT,
};

/// Host used in the base URL when none is configured
pub const DEFAULT_URL_HOST: &str = "localhost";

/// Bind address used when no host is configured
const BIND_ALL: &str = "0.0.0.0";

/// Command-line values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest precedence first: built-in defaults, the file (optional),
    /// `VOLSERVE_*` environment variables (`__` between nesting levels), `overrides`.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("VOLSERVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.port", i64::from(types::DEFAULT_PORT))?
            .set_default("storage.root", types::DEFAULT_ROOT)?
            .set_default("logging.level", types::DEFAULT_LOG_LEVEL)?
            .set_default("logging.format", types::DEFAULT_LOG_FORMAT)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", types::DEFAULT_ACCESS_LOG_FORMAT)?
            .set_default("performance.keep_alive", true)?
            .set_default(
                "performance.header_read_timeout",
                types::DEFAULT_HEADER_READ_TIMEOUT,
            )?
            .set_default(
                "performance.shutdown_grace_period",
                types::DEFAULT_SHUTDOWN_GRACE_PERIOD,
            )?
            .set_override_option("storage.root", overrides.root.clone())?
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Socket address to listen on
    pub fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        let host = self.server.host.as_deref().unwrap_or(BIND_ALL);
        let addr = format!("{host}:{}", self.server.port);
        (host, self.server.port)
            .to_socket_addrs()
            .and_then(|mut addrs| {
                addrs.next().ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved")
                })
            })
            .map_err(|source| ServerError::Address { addr, source })
    }

    /// `http://<host>:<port>/` for the given listening port
    pub fn base_url(&self, port: u16) -> String {
        let host = self.server.host.as_deref().unwrap_or(DEFAULT_URL_HOST);
        format!("http://{host}:{port}/")
    }
}
