//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the static-file path and the upload
//! endpoint: MIME resolution, caching, range parsing, and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_416_response, build_bad_request_response, build_liveness_response,
    build_options_response, build_problem_response, json_response,
};
