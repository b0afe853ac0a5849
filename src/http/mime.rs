//! MIME type resolution module
//!
//! Resolves a Content-Type from a file extension. Configured overrides win
//! over the built-in table; an unknown extension falls back to the configured
//! default (`text/plain` out of the box) rather than being rejected.

use crate::config::HttpConfig;

/// Resolve the Content-Type for a file extension.
///
/// Lookup order: `http.mime_overrides`, then the built-in table, then
/// `http.default_content_type`. Extensions are matched case-insensitively.
pub fn content_type_for<'a>(extension: Option<&str>, http: &'a HttpConfig) -> &'a str {
    let Some(ext) = extension else {
        return &http.default_content_type;
    };

    let ext = ext.to_ascii_lowercase();

    if let Some(mapped) = http.mime_overrides.get(&ext) {
        return mapped;
    }

    builtin_content_type(&ext).unwrap_or(&http.default_content_type)
}

/// Built-in extension table for the common web types
fn builtin_content_type(extension: &str) -> Option<&'static str> {
    let content_type = match extension {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",

        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn http_config() -> HttpConfig {
        Config::load_from("no-such-config").unwrap().http
    }

    #[test]
    fn test_common_types() {
        let http = http_config();
        assert_eq!(
            content_type_for(Some("html"), &http),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for(Some("css"), &http), "text/css");
        assert_eq!(content_type_for(Some("json"), &http), "application/json");
        assert_eq!(content_type_for(Some("png"), &http), "image/png");
    }

    #[test]
    fn test_unknown_extension_falls_back_to_default() {
        let http = http_config();
        assert_eq!(content_type_for(Some("xyz"), &http), "text/plain");
        assert_eq!(content_type_for(None, &http), "text/plain");
    }

    #[test]
    fn test_hash_override() {
        let http = http_config();
        assert_eq!(content_type_for(Some("hash"), &http), "text/plain");
    }

    #[test]
    fn test_override_beats_builtin_table() {
        let mut http = http_config();
        http.mime_overrides
            .insert("png".to_string(), "application/x-custom".to_string());
        assert_eq!(content_type_for(Some("png"), &http), "application/x-custom");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let http = http_config();
        assert_eq!(
            content_type_for(Some("HTML"), &http),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for(Some("HASH"), &http), "text/plain");
    }
}
