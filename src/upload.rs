//! Uploader: turn a user-supplied path, URL or byte buffer into a validated
//! [`ResumeFile`].
//!
//! A resume is accepted only when it is non-empty, named `*.pdf`, starts with
//! the `%PDF` magic bytes and fits within the configured size limit. URL
//! inputs are checked against the limit from `Content-Length` before the body
//! is read, then again chunk by chunk as it arrives.

use crate::error::ResumindError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A validated PDF held in memory, ready for the workflow.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    /// File name as supplied by the user (no directory part).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    /// Validate an in-memory upload.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        max_bytes: u64,
    ) -> Result<Self, ResumindError> {
        let name = name.into();
        validate(&name, &bytes, max_bytes)?;
        Ok(Self { name, bytes })
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Name of the preview image stored next to this resume: `cv.pdf` → `cv.png`.
    pub fn preview_name(&self) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("resume");
        format!("{stem}.png")
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP(S) URL to a validated [`ResumeFile`].
pub async fn resolve_upload(
    input: &str,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<ResumeFile, ResumindError> {
    if input.trim().is_empty() {
        return Err(ResumindError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, max_bytes, timeout_secs).await
    } else {
        read_local(Path::new(input), max_bytes).await
    }
}

async fn read_local(path: &Path, max_bytes: u64) -> Result<ResumeFile, ResumindError> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| io_to_input(path, e))?;
    if !meta.is_file() {
        return Err(ResumindError::InvalidInput {
            input: path.display().to_string(),
        });
    }

    let name = file_name_of(path);
    // Refuse before reading a multi-gigabyte file into memory.
    if meta.len() > max_bytes {
        return Err(ResumindError::FileTooLarge {
            name,
            size: meta.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| io_to_input(path, e))?;
    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    ResumeFile::from_bytes(name, bytes, max_bytes)
}

async fn download_url(
    url: &str,
    max_bytes: u64,
    timeout_secs: u64,
) -> Result<ResumeFile, ResumindError> {
    info!("Downloading resume from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ResumindError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ResumindError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ResumindError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ResumindError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    if let Some(len) = response.content_length() {
        if len > max_bytes {
            return Err(ResumindError::FileTooLarge {
                name,
                size: len,
                limit: max_bytes,
            });
        }
    }

    // Content-Length can be absent or wrong; enforce the limit while reading.
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ResumindError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
    {
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > max_bytes {
            return Err(ResumindError::FileTooLarge {
                name,
                size: bytes.len() as u64,
                limit: max_bytes,
            });
        }
    }

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    ResumeFile::from_bytes(name, bytes, max_bytes)
}

/// Validate name, size and magic bytes of an upload.
pub fn validate(name: &str, bytes: &[u8], max_bytes: u64) -> Result<(), ResumindError> {
    let is_pdf_name = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf_name {
        return Err(ResumindError::UnsupportedFileType {
            name: name.to_string(),
        });
    }

    if bytes.is_empty() {
        return Err(ResumindError::EmptyFile {
            name: name.to_string(),
        });
    }

    let size = bytes.len() as u64;
    if size > max_bytes {
        return Err(ResumindError::FileTooLarge {
            name: name.to_string(),
            size,
            limit: max_bytes,
        });
    }

    if !bytes.starts_with(b"%PDF") {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(ResumindError::NotAPdf {
            name: name.to_string(),
            magic,
        });
    }

    Ok(())
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `20 MB`.
///
/// Base 1024, at most two decimals, trailing zeros dropped.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exp < UNITS.len() - 1 {
        scaled /= 1024;
        exp += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exp as i32);

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exp])
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn io_to_input(path: &Path, e: std::io::Error) -> ResumindError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => ResumindError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ResumindError::FileNotFound {
            path: PathBuf::from(path),
        },
    }
}

/// Extract a file name from the URL path, falling back to `resume.pdf`.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "resume.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 20 * 1024 * 1024;

    fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.pdf"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn accepts_pdf_with_uppercase_extension() {
        let f = ResumeFile::from_bytes("CV.PDF", pdf_bytes(), LIMIT).unwrap();
        assert_eq!(f.preview_name(), "CV.png");
    }

    #[test]
    fn rejects_non_pdf_extension() {
        let err = ResumeFile::from_bytes("cv.docx", pdf_bytes(), LIMIT).unwrap_err();
        assert!(matches!(err, ResumindError::UnsupportedFileType { .. }));
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = ResumeFile::from_bytes("cv.pdf", b"PK\x03\x04zip".to_vec(), LIMIT).unwrap_err();
        match err {
            ResumindError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty() {
        let err = ResumeFile::from_bytes("cv.pdf", Vec::new(), LIMIT).unwrap_err();
        assert!(matches!(err, ResumindError::EmptyFile { .. }));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let mut bytes = pdf_bytes();
        bytes.resize(64, b' ');
        assert!(ResumeFile::from_bytes("cv.pdf", bytes.clone(), 64).is_ok());

        bytes.push(b' ');
        let err = ResumeFile::from_bytes("cv.pdf", bytes, 64).unwrap_err();
        assert!(matches!(err, ResumindError::FileTooLarge { size: 65, limit: 64, .. }));
    }

    #[test]
    fn preview_name_keeps_inner_dots() {
        let f = ResumeFile::from_bytes("jane.doe.2024.pdf", pdf_bytes(), LIMIT).unwrap();
        assert_eq!(f.preview_name(), "jane.doe.2024.png");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(LIMIT), "20 MB");
        assert_eq!(format_size(1_234_567), "1.18 MB");
    }

    #[tokio::test]
    async fn resolve_local_missing_file() {
        let err = resolve_upload("/definitely/not/here.pdf", LIMIT, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ResumindError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn resolve_local_too_large_before_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        let mut bytes = pdf_bytes();
        bytes.resize(200, b' ');
        tokio::fs::write(&path, &bytes).await.unwrap();

        let err = resolve_upload(path.to_str().unwrap(), 100, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ResumindError::FileTooLarge { size: 200, .. }));
    }

    #[tokio::test]
    async fn resolve_local_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jane.pdf");
        tokio::fs::write(&path, pdf_bytes()).await.unwrap();

        let f = resolve_upload(path.to_str().unwrap(), LIMIT, 5).await.unwrap();
        assert_eq!(f.name, "jane.pdf");
        assert_eq!(f.size(), pdf_bytes().len() as u64);
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(head: String, body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/cv.pdf")
    }

    /// A single chunk in chunked transfer encoding, plus the terminator.
    fn chunked(payload: &[u8]) -> Vec<u8> {
        let mut body = format!("{:x}\r\n", payload.len()).into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n0\r\n\r\n");
        body
    }

    const CHUNKED_HEAD: &str = "HTTP/1.1 200 OK\r\n\
        Content-Type: application/pdf\r\n\
        Transfer-Encoding: chunked\r\n\
        Connection: close\r\n\r\n";

    #[tokio::test]
    async fn download_refuses_large_content_length() {
        let head = "HTTP/1.1 200 OK\r\n\
            Content-Length: 5000\r\n\
            Connection: close\r\n\r\n"
            .to_string();
        let url = serve_once(head, pdf_bytes()).await;

        let err = resolve_upload(&url, 100, 5).await.unwrap_err();
        assert!(matches!(
            err,
            ResumindError::FileTooLarge { size: 5000, limit: 100, .. }
        ));
    }

    #[tokio::test]
    async fn download_caps_body_without_length() {
        let mut payload = pdf_bytes();
        payload.resize(150, b' ');
        let url = serve_once(CHUNKED_HEAD.to_string(), chunked(&payload)).await;

        let err = resolve_upload(&url, 100, 5).await.unwrap_err();
        match err {
            ResumindError::FileTooLarge { name, size, limit } => {
                assert_eq!(name, "cv.pdf");
                assert!(size > 100, "size {size}");
                assert_eq!(limit, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn download_within_limit() {
        let url = serve_once(CHUNKED_HEAD.to_string(), chunked(&pdf_bytes())).await;

        let f = resolve_upload(&url, 100, 5).await.unwrap();
        assert_eq!(f.name, "cv.pdf");
        assert_eq!(f.bytes, pdf_bytes());
    }
}
