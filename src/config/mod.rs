// Configuration module entry point
// Loads the immutable server configuration once at startup

mod types;

use std::net::SocketAddr;

pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
};

impl Config {
    /// Load configuration from "config.toml" in the working directory
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error: every setting has a default, so the
    /// server runs with no configuration at all.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.access_log", true)?
            .set_default("http.default_content_type", "text/plain")?
            .set_default("http.mime_overrides.hash", "text/plain")?
            .set_default("http.max_body_size", 524_288_000)? // 500MB
            .set_default("http.max_part_size", 524_288_000)? // 500MB
            .set_default("http.enable_cors", false)?
            .set_default("performance.header_read_timeout", 600)? // 10 minutes
            .set_default("performance.keep_alive_timeout", 600)? // 10 minutes
            .set_default("storage.public_dir", "wwwroot")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
