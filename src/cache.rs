use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnnofetchError;

/// Downloads a remote file to a local destination. Implemented over HTTP for
/// production use; tests substitute mocks.
pub trait RemoteSource: Send + Sync {
    fn download(&self, url: &str, destination: &Path) -> Result<(), AnnofetchError>;
}

#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self, AnnofetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("annofetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(AnnofetchError::filesystem)?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| AnnofetchError::Fetch(err.to_string()))?;
        Ok(Self { client })
    }

    fn write_response_to_file(
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<(), AnnofetchError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "remote request failed".to_string());
            return Err(AnnofetchError::FetchStatus { status, message });
        }
        let mut file = File::create(destination).map_err(AnnofetchError::filesystem)?;
        io::copy(&mut response, &mut file).map_err(AnnofetchError::filesystem)?;
        Ok(())
    }
}

impl RemoteSource for HttpRemote {
    fn download(&self, url: &str, destination: &Path) -> Result<(), AnnofetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| AnnofetchError::Fetch(err.to_string()))?;
        Self::write_response_to_file(response, destination)
    }
}

/// Sidecar record written next to each downloaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRecord {
    pub source_url: String,
    pub fetched_at: String,
    pub tool: String,
}

/// Resolves (cache path, source url) pairs to usable local files.
///
/// A missing file is fetched; an existing file is re-fetched unless
/// `use_cache` is set. Paths ending in `.gz` are inflated to a sibling path
/// with the suffix stripped, and the sibling is returned; the compressed file
/// stays on disk as the cache artifact.
pub struct FileCache<R: RemoteSource> {
    remote: R,
    use_cache: bool,
}

impl<R: RemoteSource> FileCache<R> {
    pub fn new(remote: R, use_cache: bool) -> Self {
        Self { remote, use_cache }
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn resolve(
        &self,
        cache_path: &Utf8Path,
        source_url: &str,
    ) -> Result<Utf8PathBuf, AnnofetchError> {
        if !cache_path.as_std_path().is_file() {
            debug!(url = source_url, path = %cache_path, "fetching remote file");
            self.fetch(cache_path, source_url)?;
        } else if !self.use_cache {
            debug!(url = source_url, path = %cache_path, "re-fetching remote file");
            self.fetch(cache_path, source_url)?;
        } else {
            debug!(path = %cache_path, "reusing cached file");
        }

        if let Some(stripped) = cache_path.as_str().strip_suffix(".gz") {
            let target = Utf8PathBuf::from(stripped);
            decompress_gz(cache_path, &target)?;
            return Ok(target);
        }
        Ok(cache_path.to_owned())
    }

    /// Downloads into a temp file in the destination directory, then swaps
    /// it into place so readers never observe a truncated cache file.
    fn fetch(&self, cache_path: &Utf8Path, source_url: &str) -> Result<(), AnnofetchError> {
        let parent = cache_path
            .parent()
            .ok_or_else(|| AnnofetchError::Filesystem("invalid cache path".to_string()))?;
        fs::create_dir_all(parent.as_std_path()).map_err(AnnofetchError::filesystem)?;
        let temp = tempfile::Builder::new()
            .prefix("annofetch-fetch")
            .tempfile_in(parent.as_std_path())
            .map_err(AnnofetchError::filesystem)?;
        self.remote.download(source_url, temp.path())?;
        if cache_path.as_std_path().exists() {
            fs::remove_file(cache_path.as_std_path()).map_err(AnnofetchError::filesystem)?;
        }
        temp.persist(cache_path.as_std_path())
            .map_err(AnnofetchError::filesystem)?;
        self.write_record(cache_path, source_url)
    }

    fn write_record(&self, cache_path: &Utf8Path, source_url: &str) -> Result<(), AnnofetchError> {
        let record = FetchRecord {
            source_url: source_url.to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("annofetch/{}", env!("CARGO_PKG_VERSION")),
        };
        let content = serde_json::to_vec_pretty(&record).map_err(AnnofetchError::filesystem)?;
        write_bytes_atomic(&record_path(cache_path), &content)
    }
}

pub fn default_cache_root() -> Result<Utf8PathBuf, AnnofetchError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("annofetch")).ok()
        })
        .ok_or_else(|| AnnofetchError::Filesystem("unable to resolve cache directory".to_string()))
}

fn record_path(cache_path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{cache_path}.fetch.json"))
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), AnnofetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path()).map_err(AnnofetchError::filesystem)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(tmp_path.as_std_path(), content).map_err(AnnofetchError::filesystem)?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path()).map_err(AnnofetchError::filesystem)?;
    Ok(())
}

fn decompress_gz(source: &Utf8Path, target: &Utf8Path) -> Result<(), AnnofetchError> {
    let file = File::open(source.as_std_path()).map_err(AnnofetchError::filesystem)?;
    let mut decoder = GzDecoder::new(file);
    let mut out = File::create(target.as_std_path()).map_err(AnnofetchError::filesystem)?;
    io::copy(&mut decoder, &mut out).map_err(AnnofetchError::filesystem)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;

    struct MockRemote {
        payload: Vec<u8>,
        calls: Mutex<usize>,
    }

    impl MockRemote {
        fn new(payload: &[u8]) -> Self {
            Self {
                payload: payload.to_vec(),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl RemoteSource for MockRemote {
        fn download(&self, _url: &str, destination: &Path) -> Result<(), AnnofetchError> {
            *self.calls.lock().unwrap() += 1;
            fs::write(destination, &self.payload).map_err(AnnofetchError::filesystem)
        }
    }

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    #[test]
    fn fetches_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "data/genes.txt");
        let cache = FileCache::new(MockRemote::new(b"content"), true);

        let resolved = cache.resolve(&path, "http://example.org/genes.txt").unwrap();
        assert_eq!(resolved, path);
        assert_eq!(fs::read(path.as_std_path()).unwrap(), b"content");
        assert_eq!(cache.remote.calls(), 1);
        assert!(record_path(&path).as_std_path().is_file());
    }

    #[test]
    fn resolve_is_idempotent_with_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "genes.txt");
        let cache = FileCache::new(MockRemote::new(b"content"), true);

        let first = cache.resolve(&path, "http://example.org/genes.txt").unwrap();
        let second = cache.resolve(&path, "http://example.org/genes.txt").unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.remote.calls(), 1);
    }

    #[test]
    fn refetches_when_cache_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "genes.txt");
        let cache = FileCache::new(MockRemote::new(b"content"), false);

        cache.resolve(&path, "http://example.org/genes.txt").unwrap();
        cache.resolve(&path, "http://example.org/genes.txt").unwrap();
        assert_eq!(cache.remote.calls(), 2);
    }

    #[test]
    fn decompresses_gz_to_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "annotations.gaf.gz");

        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"!gaf-version: 2.1\n").unwrap();
        let payload = encoder.finish().unwrap();

        let cache = FileCache::new(MockRemote::new(&payload), true);
        let resolved = cache.resolve(&path, "http://example.org/a.gaf.gz").unwrap();

        assert_eq!(resolved, temp_path(&dir, "annotations.gaf"));
        assert!(path.as_std_path().is_file());
        assert_eq!(
            fs::read_to_string(resolved.as_std_path()).unwrap(),
            "!gaf-version: 2.1\n"
        );
    }
}
