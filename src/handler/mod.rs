//! Request handler module
//!
//! Routing dispatch, static file serving out of the public directory, and
//! the multipart upload endpoint.

pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
