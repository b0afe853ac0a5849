//! Logger module
//!
//! Logging utilities for the server:
//! - Server lifecycle and connection logging
//! - Timestamped upload result lines
//! - Error and warning logging
//! - File-based logging support

mod writer;

use crate::config::Config;
use chrono::Local;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Async server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Public directory: {}", config.storage.public_dir));
    write_info("Upload endpoint: POST /api/upload");
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info(&format!(
        "Body size cap: {} bytes (lifted for the upload route)",
        config.http.max_body_size
    ));
    write_info("Using Tokio runtime for concurrency");
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    write_info(&format!("[Request] {method} {uri} {version:?}"));
}

pub fn log_response(size: usize) {
    write_info(&format!("[Response] Sent 200 OK ({size} bytes)"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Console line for a stored upload, timestamped like the rest of the
/// upload accounting
pub fn log_upload_success(file_name: &str, size: u64) {
    write_info(&format!(
        "[{}] 文件上传成功: {file_name} ({size} 字节)",
        Local::now().format("%H:%M:%S")
    ));
}

/// Console line for a failed upload; `message` already carries the
/// client-facing text
pub fn log_upload_failure(message: &str) {
    write_error(&format!(
        "[{}] {message}",
        Local::now().format("%H:%M:%S")
    ));
}

pub fn log_shutdown() {
    write_info("\n[Signal] Ctrl+C received, shutting down");
}
