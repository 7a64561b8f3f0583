//! Single-shot PDF downloader.
//!
//! Each call fetches one URL, validates the response, buffers the whole body
//! and only then creates the destination file. A file that already exists is
//! never touched, so repeated runs skip what is on disk.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use pdfharvest_shared::{
    Candidate, DownloadedFile, HttpConfig, MAX_REDIRECTS, PdfHarvestError, Result,
};

use crate::naming::url_to_filename;

/// Content type a response must carry to be saved.
const PDF_CONTENT_TYPE: &str = "application/pdf";

// ---------------------------------------------------------------------------
// Downloader
// ---------------------------------------------------------------------------

/// Downloads PDFs into a fixed output directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
}

impl Downloader {
    /// Create a downloader writing into `output_dir`, using the download
    /// timeout and user agent from `http`.
    pub fn new(output_dir: impl Into<PathBuf>, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&http.user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(http.download_timeout_secs))
            .build()
            .map_err(|e| PdfHarvestError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    /// Directory files are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination path for a link whose text is `source`.
    pub fn target_path(&self, source: &str) -> Result<PathBuf> {
        let filename = url_to_filename(source);
        if filename.is_empty() {
            return Err(PdfHarvestError::validation(format!(
                "{source}: cannot derive a filename"
            )));
        }
        Ok(self.output_dir.join(filename))
    }

    /// Download `candidate` to the path normalized from its source text.
    ///
    /// Fails without side effects if the file already exists, the status is
    /// not 200, the content type is not `application/pdf`, or the body is
    /// empty.
    #[instrument(skip_all, fields(url = %candidate.url))]
    pub async fn download(&self, candidate: &Candidate) -> Result<DownloadedFile> {
        let url = &candidate.url;
        let path = self.target_path(&candidate.source)?;

        if path.is_file() {
            debug!(?path, "file already exists, skipping");
            return Err(PdfHarvestError::AlreadyExists { path });
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PdfHarvestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PdfHarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains(PDF_CONTENT_TYPE) {
            return Err(PdfHarvestError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }

        // Buffer everything before touching the filesystem.
        let body = response
            .bytes()
            .await
            .map_err(|e| PdfHarvestError::Network(format!("{url}: failed to read body: {e}")))?;
        if body.is_empty() {
            return Err(PdfHarvestError::EmptyBody {
                url: url.to_string(),
            });
        }
        let fetched_at = Utc::now();

        write_new_file(&path, &body)?;

        let file = DownloadedFile {
            url: url.clone(),
            path,
            bytes: body.len() as u64,
            sha256: compute_hash(&body),
            fetched_at,
        };

        info!(bytes = file.bytes, path = %file.path.display(), "downloaded");
        Ok(file)
    }
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Create `path` (and parents) with mode 0755 if it does not exist.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(path)
        .map_err(|e| PdfHarvestError::io(path, e))?;

    info!(path = %path.display(), "created output directory");
    Ok(())
}

/// Create `path` exclusively and write `bytes` in one go.
fn write_new_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => PdfHarvestError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => PdfHarvestError::io(path, e),
        })?;

    write_or_discard(&mut file, path, bytes)
}

/// Write all of `bytes`, removing `path` if the write fails part way.
fn write_or_discard(writer: &mut impl Write, path: &Path, bytes: &[u8]) -> Result<()> {
    if let Err(e) = writer.write_all(bytes).and_then(|()| writer.flush()) {
        if let Err(rm) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %rm, "could not remove partial file");
        }
        return Err(PdfHarvestError::io(path, e));
    }
    Ok(())
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io;
    use uuid::Uuid;

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n%fake\n";

    fn temp_output_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pdfharvest-{label}-{}", Uuid::now_v7()))
    }

    fn downloader(dir: &Path) -> Downloader {
        ensure_output_dir(dir).unwrap();
        Downloader::new(dir, &HttpConfig::default()).unwrap()
    }

    fn candidate(source: String) -> Candidate {
        Candidate::parse(&source).unwrap()
    }

    /// Accepts `limit` bytes, then fails like a full disk.
    struct ShortWriter {
        inner: File,
        limit: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::Error::other("no space left on device"));
            }
            let n = buf.len().min(self.limit);
            self.limit -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    async fn pdf_server(path: &str) -> wiremock::MockServer {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_raw(PDF_BYTES, "application/pdf"),
            )
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"hello world");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn target_path_uses_normalized_name() {
        let dir = PathBuf::from("PDFs");
        let dl = Downloader::new(&dir, &HttpConfig::default()).unwrap();
        assert_eq!(
            dl.target_path("https://x.com/Docs/Mill_Manual.PDF").unwrap(),
            dir.join("mill_manual.pdf")
        );
    }

    #[test]
    fn target_path_ignores_percent_encoding() {
        let dir = PathBuf::from("PDFs");
        let dl = Downloader::new(&dir, &HttpConfig::default()).unwrap();
        let candidate = candidate("https://www.haascnc.com/docs/Mill Manual.pdf".into());
        assert_eq!(candidate.url.path(), "/docs/Mill%20Manual.pdf");
        assert_eq!(
            dl.target_path(&candidate.source).unwrap(),
            dir.join("mill_manual.pdf")
        );
    }

    #[test]
    fn failed_write_removes_partial_file() {
        let dir = temp_output_dir("short-write");
        ensure_output_dir(&dir).unwrap();
        let path = dir.join("partial.pdf");

        let inner = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();
        let mut writer = ShortWriter { inner, limit: 4 };

        let result = write_or_discard(&mut writer, &path, PDF_BYTES);

        assert!(matches!(result, Err(PdfHarvestError::Io { .. })));
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_new_file_writes_everything() {
        let dir = temp_output_dir("write");
        ensure_output_dir(&dir).unwrap();
        let path = dir.join("a.pdf");

        write_new_file(&path, PDF_BYTES).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PDF_BYTES);
        assert!(matches!(
            write_new_file(&path, PDF_BYTES),
            Err(PdfHarvestError::AlreadyExists { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn ensure_output_dir_creates_nested() {
        let root = temp_output_dir("mkdir");
        let nested = root.join("a").join("b");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_output_dir(&nested).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
            // umask may clear bits, never add them
            assert_eq!(mode & 0o777 & !0o755, 0);
        }

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn downloads_pdf() {
        let server = pdf_server("/docs/manual.pdf").await;
        let dir = temp_output_dir("ok");
        let dl = downloader(&dir);

        let target = candidate(format!("{}/docs/manual.pdf", server.uri()));
        let file = dl.download(&target).await.unwrap();

        assert_eq!(file.path, dir.join("manual.pdf"));
        assert_eq!(file.bytes, PDF_BYTES.len() as u64);
        assert_eq!(file.sha256, compute_hash(PDF_BYTES));
        assert_eq!(std::fs::read(&file.path).unwrap(), PDF_BYTES);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn never_overwrites() {
        let server = pdf_server("/docs/manual.pdf").await;
        let dir = temp_output_dir("twice");
        let dl = downloader(&dir);

        let target = candidate(format!("{}/docs/manual.pdf", server.uri()));
        assert!(dl.download(&target).await.is_ok());

        let second = dl.download(&target).await;
        assert!(matches!(second, Err(PdfHarvestError::AlreadyExists { .. })));
        assert_eq!(files_in(&dir), 1);

        // The existence check happens before any request.
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejects_html_content_type() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw("<html>login required</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let dir = temp_output_dir("html");
        let dl = downloader(&dir);

        let target = candidate(format!("{}/docs/manual.pdf", server.uri()));
        let result = dl.download(&target).await;

        match result {
            Err(PdfHarvestError::ContentType { content_type, .. }) => {
                assert!(content_type.starts_with("text/html"));
            }
            other => panic!("expected ContentType error, got {other:?}"),
        }
        assert_eq!(files_in(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejects_non_200() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(404).set_body_raw(PDF_BYTES, "application/pdf"),
            )
            .mount(&server)
            .await;

        let dir = temp_output_dir("404");
        let dl = downloader(&dir);

        let target = candidate(format!("{}/missing.pdf", server.uri()));
        let result = dl.download(&target).await;

        assert!(matches!(
            result,
            Err(PdfHarvestError::HttpStatus { status: 404, .. })
        ));
        assert_eq!(files_in(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rejects_empty_body() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_raw(Vec::<u8>::new(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let dir = temp_output_dir("empty");
        let dl = downloader(&dir);

        let target = candidate(format!("{}/empty.pdf", server.uri()));
        let result = dl.download(&target).await;

        assert!(matches!(result, Err(PdfHarvestError::EmptyBody { .. })));
        assert_eq!(files_in(&dir), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_output_dir_is_io_error() {
        let server = pdf_server("/a.pdf").await;
        let dir = temp_output_dir("absent");
        let dl = Downloader::new(&dir, &HttpConfig::default()).unwrap();

        let target = candidate(format!("{}/a.pdf", server.uri()));
        let result = dl.download(&target).await;

        assert!(matches!(result, Err(PdfHarvestError::Io { .. })));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn empty_filename_is_rejected_before_request() {
        let server = wiremock::MockServer::start().await;
        let dir = temp_output_dir("noname");
        let dl = downloader(&dir);

        // Last segment "---" normalizes to nothing.
        let target = candidate(format!("{}/---", server.uri()));
        let result = dl.download(&target).await;

        assert!(matches!(result, Err(PdfHarvestError::Validation { .. })));
        assert!(server.received_requests().await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
