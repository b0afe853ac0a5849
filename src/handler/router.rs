//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body-limit grants, method
//! validation, and dispatch to the liveness, upload, and static-file paths.

use crate::config::{Config, HttpConfig};
use crate::handler::{static_files, upload};
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Path of the upload endpoint
pub const UPLOAD_PATH: &str = "/api/upload";

/// Body-size grant handed to a route before its body is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLimit {
    /// No cap; the route may read an arbitrarily large body
    Unbounded,
    /// Bodies above this many bytes are rejected with 413
    Capped(u64),
}

/// Request context encapsulating information needed for static file serving
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
    pub access_log: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    config: Arc<Config>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let is_head = method == Method::HEAD;

    let access_log = config.logging.access_log;
    if access_log {
        logger::log_request(&method, req.uri(), req.version());
    }

    // 1. Grant the body limit for this route; only the upload route gets to
    //    read past the global cap, and it dispatches before the method check
    let limit = body_limit_for(&method, &path, &config.http);
    if limit == BodyLimit::Unbounded {
        return Ok(upload::handle_upload(req, &config).await);
    }

    // 2. Check HTTP method
    if let Some(resp) = check_http_method(&method, &path, config.http.enable_cors) {
        return Ok(resp);
    }

    // 3. Check body size against the granted cap
    if let BodyLimit::Capped(max) = limit {
        if let Some(resp) = check_body_size(req.headers(), max) {
            return Ok(resp);
        }
    }

    // 4. Liveness endpoint
    if path == "/" {
        return Ok(http::build_liveness_response(is_head));
    }

    // 5. Static files under the public root
    let ctx = RequestContext {
        path: &path,
        is_head,
        if_none_match: req
            .headers()
            .get("if-none-match")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        range_header: req
            .headers()
            .get("range")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        access_log,
    };

    Ok(static_files::serve(&ctx, &config).await)
}

/// Determine the body-size grant for a route.
///
/// `POST /api/upload` reads bodies past the global cap; every other route is
/// held to `http.max_body_size`.
pub fn body_limit_for(method: &Method, path: &str, http: &HttpConfig) -> BodyLimit {
    if *method == Method::POST && path == UPLOAD_PATH {
        BodyLimit::Unbounded
    } else {
        BodyLimit::Capped(http.max_body_size)
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(
    method: &Method,
    path: &str,
    enable_cors: bool,
) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn http_config() -> HttpConfig {
        Config::load_from("no-such-config").unwrap().http
    }

    #[test]
    fn test_upload_route_is_unbounded() {
        let http = http_config();
        assert_eq!(
            body_limit_for(&Method::POST, UPLOAD_PATH, &http),
            BodyLimit::Unbounded
        );
    }

    #[test]
    fn test_other_routes_are_capped() {
        let http = http_config();
        assert_eq!(
            body_limit_for(&Method::GET, "/", &http),
            BodyLimit::Capped(524_288_000)
        );
        assert_eq!(
            body_limit_for(&Method::GET, UPLOAD_PATH, &http),
            BodyLimit::Capped(524_288_000)
        );
        assert_eq!(
            body_limit_for(&Method::POST, "/other", &http),
            BodyLimit::Capped(524_288_000)
        );
    }

    #[test]
    fn test_check_body_size() {
        let mut headers = HeaderMap::new();
        assert!(check_body_size(&headers, 100).is_none());

        headers.insert("content-length", "50".parse().unwrap());
        assert!(check_body_size(&headers, 100).is_none());

        headers.insert("content-length", "101".parse().unwrap());
        let resp = check_body_size(&headers, 100).unwrap();
        assert_eq!(resp.status(), 413);

        headers.insert("content-length", "not-a-number".parse().unwrap());
        assert!(check_body_size(&headers, 100).is_none());
    }

    #[tokio::test]
    async fn test_method_check_runs_before_body_size_check() {
        let config = Arc::new(Config::load_from("no-such-config").unwrap());
        let oversized = format!("{}", 524_288_000_u64 + 1);

        // Disallowed method with an oversized body is answered 405, not 413
        let req = Request::builder()
            .method(Method::POST)
            .uri("/other")
            .header("content-length", oversized.as_str())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&config)).await.unwrap();
        assert_eq!(resp.status(), 405);

        // An allowed method past the cap still gets 413
        let req = Request::builder()
            .method(Method::GET)
            .uri("/other")
            .header("content-length", oversized.as_str())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, config).await.unwrap();
        assert_eq!(resp.status(), 413);
    }

    #[test]
    fn test_check_http_method() {
        assert!(check_http_method(&Method::GET, "/", false).is_none());
        assert!(check_http_method(&Method::HEAD, "/", false).is_none());

        let resp = check_http_method(&Method::OPTIONS, "/", false).unwrap();
        assert_eq!(resp.status(), 204);

        let resp = check_http_method(&Method::DELETE, "/", false).unwrap();
        assert_eq!(resp.status(), 405);
    }
}
