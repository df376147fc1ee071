//! Snapshot acquisition — HTTP download with retry, gzip decode, local files.
//!
//! The `SnapshotSource` trait abstracts over where a provider snapshot comes
//! from (live HTTP endpoint, local file) so the pipeline and tests can swap
//! implementations. Sources yield raw CSV bytes, already decompressed.

use flate2::read::GzDecoder;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Structured errors from snapshot acquisition.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("gzip decode failed: {0}")]
    Decompress(String),

    #[error("snapshot is empty: {0}")]
    EmptySnapshot(String),

    #[error("snapshot read failed: {0}")]
    Io(String),
}

/// A provider snapshot source.
pub trait SnapshotSource {
    /// Human-readable origin for error messages and the run report.
    fn describe(&self) -> String;

    /// Fetch the raw CSV bytes, decompressed and non-empty.
    fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Live HTTP endpoint with bounded retry and exponential backoff.
pub struct HttpSource {
    url: String,
    gzipped: bool,
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, gzipped: bool) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("scripdiff/0.1")
            .build()
            .expect("failed to build HTTP client");

        Self {
            url: url.into(),
            gzipped,
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    fn fetch_with_retry(&self) -> Result<Vec<u8>, FetchError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&self.url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        last_error = Some(FetchError::HttpStatus {
                            status: status.as_u16(),
                            url: self.url.clone(),
                        });
                        continue;
                    }
                    let body = resp
                        .bytes()
                        .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;
                    return Ok(body.to_vec());
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(FetchError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(FetchError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl SnapshotSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let body = self.fetch_with_retry()?;
        let bytes = if self.gzipped { gunzip(&body)? } else { body };
        ensure_non_empty(bytes, &self.describe())
    }
}

/// Local snapshot file; `.gz` paths are decompressed transparently.
///
/// Used for offline runs and tests.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_gzipped(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some("gz")
    }
}

impl SnapshotSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let body = std::fs::read(&self.path)
            .map_err(|e| FetchError::Io(format!("{}: {e}", self.path.display())))?;
        let bytes = if self.is_gzipped() { gunzip(&body)? } else { body };
        ensure_non_empty(bytes, &self.describe())
    }
}

/// Decompress a gzip payload fully into memory.
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| FetchError::Decompress(e.to_string()))?;
    Ok(decoded)
}

fn ensure_non_empty(bytes: Vec<u8>, origin: &str) -> Result<Vec<u8>, FetchError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(FetchError::EmptySnapshot(origin.to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn gunzip_roundtrip() {
        let original = b"col_a,col_b\n1,2\n";
        let decoded = gunzip(&gzip(original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn gunzip_rejects_garbage() {
        let err = gunzip(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, FetchError::Decompress(_)));
    }

    #[test]
    fn file_source_reads_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let bytes = FileSource::new(&path).fetch().unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[test]
    fn file_source_decompresses_gz_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv.gz");
        std::fs::write(&path, gzip(b"a,b\n1,2\n")).unwrap();

        let bytes = FileSource::new(&path).fetch().unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[test]
    fn empty_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "  \n").unwrap();

        let err = FileSource::new(&path).fetch().unwrap_err();
        assert!(matches!(err, FetchError::EmptySnapshot(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FileSource::new("/nonexistent/snapshot.csv").fetch().unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
