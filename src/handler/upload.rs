//! File upload endpoint module
//!
//! `POST /api/upload` takes a multipart form with a `file` field and writes
//! it into the public directory under its original name, where the static
//! file path serves it right back. The destination name is not sanitized and
//! concurrent same-name uploads race; the last completed write wins.

use crate::config::Config;
use crate::http;
use crate::logger;
use futures_util::TryStreamExt;
use http_body_util::{BodyStream, Full};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use multer::{Constraints, SizeLimit};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Form field the upload must arrive under
const FILE_FIELD: &str = "file";

/// Client error body when the request carries no file part at all
const MSG_NO_FILE: &str = "没有上传文件";

/// Client error body when the `file` field is missing or empty
const MSG_EMPTY_FILE: &str = "文件为空";

type SaveError = Box<dyn std::error::Error + Send + Sync>;

/// Result of the save routine, mapped to a response by [`handle_upload`]
#[derive(Debug)]
pub enum UploadOutcome {
    /// File written under the public directory
    Saved { file_name: String, size: u64 },
    /// Malformed request; fixed message, not logged
    Rejected(&'static str),
    /// Fault while parsing or writing; raw error text for the client
    Failed(String),
}

/// Success reply body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadReply {
    message: &'static str,
    file_name: String,
    size: u64,
}

/// Handle `POST /api/upload`: run the save routine and map its outcome to a
/// response.
pub async fn handle_upload<B>(req: Request<B>, config: &Config) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    match save_upload(req, config).await {
        UploadOutcome::Saved { file_name, size } => {
            logger::log_upload_success(&file_name, size);
            http::json_response(
                StatusCode::OK,
                &UploadReply {
                    message: "上传成功",
                    file_name,
                    size,
                },
            )
        }
        UploadOutcome::Rejected(message) => http::build_bad_request_response(message),
        UploadOutcome::Failed(detail) => {
            let message = format!("上传失败: {detail}");
            logger::log_upload_failure(&message);
            http::build_problem_response(&message)
        }
    }
}

/// Save routine: parse the multipart body, find the `file` field, and stream
/// it to disk.
async fn save_upload<B>(req: Request<B>, config: &Config) -> UploadOutcome
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    // A request without a multipart content type has no file
    let boundary = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok());
    let Some(boundary) = boundary else {
        return UploadOutcome::Rejected(MSG_NO_FILE);
    };

    let constraints = Constraints::new()
        .size_limit(SizeLimit::new().per_field(config.http.max_part_size));

    let stream = BodyStream::new(req.into_body())
        .try_filter_map(|frame| std::future::ready(Ok(frame.into_data().ok())));
    let mut form = multer::Multipart::with_constraints(stream, boundary, constraints);

    let mut saw_file_part = false;
    loop {
        let field = match form.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return UploadOutcome::Failed(e.to_string()),
        };

        // Only parts carrying a filename count as file parts
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        saw_file_part = true;

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        return store_field(field, file_name, &config.storage.public_dir).await;
    }

    if saw_file_part {
        // File parts existed but none was named `file`
        UploadOutcome::Rejected(MSG_EMPTY_FILE)
    } else {
        UploadOutcome::Rejected(MSG_NO_FILE)
    }
}

/// Stream one field to disk under the public directory.
async fn store_field(
    mut field: multer::Field<'static>,
    file_name: String,
    public_dir: &str,
) -> UploadOutcome {
    // Peek for data first so an empty part never touches the disk
    let first = loop {
        match field.chunk().await {
            Ok(Some(chunk)) if chunk.is_empty() => {}
            Ok(Some(chunk)) => break chunk,
            Ok(None) => return UploadOutcome::Rejected(MSG_EMPTY_FILE),
            Err(e) => return UploadOutcome::Failed(e.to_string()),
        }
    };

    match write_to_disk(&mut field, first, public_dir, &file_name).await {
        Ok(size) => UploadOutcome::Saved { file_name, size },
        Err(e) => UploadOutcome::Failed(e.to_string()),
    }
}

/// Write the peeked chunk and the rest of the field to the destination.
///
/// The destination name is the client's original filename, unsanitized.
/// `File::create` truncates, so re-uploads overwrite. A failure mid-stream
/// leaves the partial file behind.
async fn write_to_disk(
    field: &mut multer::Field<'static>,
    first: Bytes,
    public_dir: &str,
    file_name: &str,
) -> Result<u64, SaveError> {
    fs::create_dir_all(public_dir).await?;

    let dest = Path::new(public_dir).join(file_name);
    let mut out = fs::File::create(&dest).await?;

    out.write_all(&first).await?;
    let mut size = first.len() as u64;

    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }

    out.flush().await?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    const BOUNDARY: &str = "----test-boundary";

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            if let Some(fname) = filename {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{fname}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                );
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Full::new(Bytes::from(multipart_body(parts))))
            .unwrap()
    }

    fn config_with_public_dir(dir: &std::path::Path) -> Config {
        let mut cfg = Config::load_from("no-such-config").unwrap();
        cfg.storage.public_dir = dir.to_string_lossy().into_owned();
        cfg
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_content_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_public_dir(dir.path());

        let req = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .body(Full::new(Bytes::from_static(b"raw")))
            .unwrap();

        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(body_string(resp).await, MSG_NO_FILE);
    }

    #[tokio::test]
    async fn test_only_text_fields_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_public_dir(dir.path());

        let req = upload_request(&[("note", None, b"just text")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(body_string(resp).await, MSG_NO_FILE);
    }

    #[tokio::test]
    async fn test_file_under_other_name_is_empty_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_public_dir(dir.path());

        let req = upload_request(&[("attachment", Some("a.txt"), b"hello")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(body_string(resp).await, MSG_EMPTY_FILE);
    }

    #[tokio::test]
    async fn test_empty_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_public_dir(dir.path());

        let req = upload_request(&[("file", Some("a.txt"), b"")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(body_string(resp).await, MSG_EMPTY_FILE);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_successful_upload() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_public_dir(dir.path());

        let req = upload_request(&[("file", Some("a.txt"), b"hello")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );

        let body: serde_json::Value =
            serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["message"], "上传成功");
        assert_eq!(body["fileName"], "a.txt");
        assert_eq!(body["size"], 5);

        let stored = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert_eq!(&stored[..], b"hello");
    }

    #[tokio::test]
    async fn test_creates_public_dir_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("wwwroot");
        let cfg = config_with_public_dir(&public);

        let req = upload_request(&[("file", Some("a.txt"), b"hello")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 200);
        assert!(public.join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_same_name_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_with_public_dir(dir.path());

        let first = upload_request(&[("file", Some("a.txt"), b"first version")]);
        assert_eq!(handle_upload(first, &cfg).await.status(), 200);

        let second = upload_request(&[("file", Some("a.txt"), b"second")]);
        assert_eq!(handle_upload(second, &cfg).await.status(), 200);

        let stored = std::fs::read(dir.path().join("a.txt")).unwrap();
        assert_eq!(&stored[..], b"second");
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        // Occupy the public-dir path with a regular file so create_dir_all fails
        let public = dir.path().join("wwwroot");
        std::fs::write(&public, b"not a directory").unwrap();
        let cfg = config_with_public_dir(&public);

        let req = upload_request(&[("file", Some("a.txt"), b"hello")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 500);

        let body = body_string(resp).await;
        let detail = body.split("上传失败: ").nth(1).unwrap();
        assert!(!detail.is_empty());
    }

    #[tokio::test]
    async fn test_part_over_size_limit_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_with_public_dir(dir.path());
        cfg.http.max_part_size = 4;

        let req = upload_request(&[("file", Some("a.txt"), b"hello world")]);
        let resp = handle_upload(req, &cfg).await;
        assert_eq!(resp.status(), 500);
        assert!(body_string(resp).await.contains("上传失败: "));
    }
}
