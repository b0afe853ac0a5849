//! Server module
//!
//! Listener setup and the accept loop. One spawned task per connection;
//! `Ctrl+C` breaks the loop and the process exits.

pub mod connection;
pub mod listener;

use crate::config::Config;
use crate::logger;
use std::sync::Arc;

/// Bind the listener and run the accept loop until `Ctrl+C`.
pub async fn run(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;
    let listener = listener::create_listener(addr)?;
    let config = Arc::new(cfg);

    logger::log_server_start(&addr, &config);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(stream, peer_addr, &config);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    Ok(())
}
