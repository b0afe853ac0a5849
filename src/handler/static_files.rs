//! Static file serving module
//!
//! Serves files from the public directory. MIME type comes from the config's
//! override map and the built-in table; unknown extensions fall back to the
//! configured default instead of being rejected. No directory listings and
//! no index files.

use crate::config::{Config, HttpConfig};
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve a request path from the public root
pub async fn serve(ctx: &RequestContext<'_>, config: &Config) -> Response<Full<Bytes>> {
    match load_from_public_root(&config.storage.public_dir, ctx.path, &config.http).await {
        Some((content, content_type)) => {
            if ctx.access_log {
                logger::log_response(content.len());
            }
            build_static_file_response(
                &content,
                content_type,
                ctx.if_none_match.as_deref(),
                ctx.is_head,
                ctx.range_header.as_deref(),
            )
        }
        None => http::build_404_response(),
    }
}

/// Load a file beneath the public root.
///
/// Returns None for missing files, directories, and paths that resolve
/// outside the root.
pub async fn load_from_public_root<'a>(
    public_dir: &str,
    path: &str,
    http: &'a HttpConfig,
) -> Option<(Vec<u8>, &'a str)> {
    // Remove the leading slash; traversal is handled by the canonicalize
    // guard below so names that merely contain ".." stay servable
    let clean_path = path.trim_start_matches('/');
    if clean_path.is_empty() {
        return None;
    }

    let file_path = Path::new(public_dir).join(clean_path);

    // Security: ensure file_path is within public_dir
    let public_dir_canonical = match Path::new(public_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Public directory not found or inaccessible '{public_dir}': {e}"
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&public_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    // No directory listings
    if file_path_canonical.is_dir() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let content_type = mime::content_type_for(
        file_path_canonical.extension().and_then(|e| e.to_str()),
        http,
    );

    Some((content, content_type))
}

/// Build static file response with `ETag` and Range support
fn build_static_file_response(
    data: &[u8],
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
    range_header: Option<&str>,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    let total_size = data.len();

    // Check if client has cached version
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    // Check for Range request
    match http::parse_range_header(range_header, total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);

            // The builder strips the body for HEAD after computing headers
            return http::response::build_partial_response(
                Bytes::from(data[start..=end].to_vec()),
                content_type,
                &etag,
                start,
                end,
                total_size,
                is_head,
            );
        }
        RangeParseResult::NotSatisfiable => {
            return http::build_416_response(total_size);
        }
        RangeParseResult::None => {
            // No Range header or malformed, return full content
        }
    }

    // Full response; Content-Length reflects the file even for HEAD, the
    // builder strips the body itself
    http::response::build_cached_response(
        Bytes::from(data.to_owned()),
        content_type,
        &etag,
        is_head,
    )
}
