// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
///
/// Built once at startup and never mutated; handlers receive it behind an
/// `Arc`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub performance: PerformanceConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads; defaults to the CPU core count when unset
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Content-Type served when the extension is unknown
    pub default_content_type: String,
    /// Extension → Content-Type entries consulted before the built-in table
    #[serde(default)]
    pub mime_overrides: HashMap<String, String>,
    /// Request body cap in bytes; lifted per-request for the upload route
    pub max_body_size: u64,
    /// Cap for a single multipart section in bytes
    pub max_part_size: u64,
    pub enable_cors: bool,
}

/// Performance configuration (connection timing)
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds allowed for reading a request's header section
    pub header_read_timeout: u64,
    /// Seconds an idle keep-alive connection may wait for the next request
    pub keep_alive_timeout: u64,
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory served as the site root; uploads are written here too
    pub public_dir: String,
}
