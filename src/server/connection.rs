// Connection handling module
// Serves a single accepted TCP connection

use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::Config;
use crate::handler;
use crate::logger;

/// Accept a connection and hand it off to a spawned task.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    config: &Arc<Config>,
) {
    if config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, Arc::clone(config));
}

/// Serve a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 connection settings (keep-alive, header timeout)
/// 3. Serves the connection with the request handler
fn handle_connection(stream: tokio::net::TcpStream, config: Arc<Config>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let header_read_timeout = config.performance.header_read_timeout;
        let keep_alive_timeout = config.performance.keep_alive_timeout;

        // Build HTTP/1 connection with keep-alive support. The header-read
        // timer also bounds the idle wait between keep-alive requests, so it
        // covers both configured limits. The body read itself is not
        // time-bounded.
        let mut builder = http1::Builder::new();
        builder.timer(TokioTimer::new());
        builder.keep_alive(keep_alive_timeout > 0);
        if header_read_timeout > 0 {
            builder.header_read_timeout(Duration::from_secs(header_read_timeout));
        }

        // Serve connection
        let svc_config = Arc::clone(&config);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let config = Arc::clone(&svc_config);
                async move { handler::handle_request(req, config).await }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
