//! HTTP fetcher
//!
//! Downloads with `ureq` on a blocking task, writing into a temporary file
//! inside the destination directory. Recognized archives are unpacked in
//! place; anything else is renamed to the last segment of the URL.
//!
//! The request timeout defaults to 30 seconds and can be changed with the
//! `BIN_ACQUIRE_HTTP_TIMEOUT` environment variable (clamped to 5..=300).

use async_trait::async_trait;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use super::extract::{self, ArchiveFormat};
use super::{FetchOptions, Fetched, Fetcher};
use crate::core::output;
use crate::core::progress::{self, ProgressGuard, upgrade_to_bytes};
use crate::error::FetchError;
use crate::util::url_filename;

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the HTTP timeout
pub const HTTP_TIMEOUT_ENV: &str = "BIN_ACQUIRE_HTTP_TIMEOUT";

/// Prefix of the temporary download files
const TEMP_PREFIX: &str = ".bin-acquire-";

/// Get HTTP timeout from environment variable or use default.
/// Cached: the variable is only read once.
fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var(HTTP_TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        Duration::from_secs(secs.clamp(5, 300))
    })
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    progress: bool,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            timeout: http_timeout(),
            progress: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Draw spinners and byte progress bars on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch_blocking(
        &self,
        url: &str,
        dest: &Path,
        options: &FetchOptions,
    ) -> Result<Fetched, FetchError> {
        let io_err = |source| FetchError::Io {
            url: url.to_string(),
            source,
        };

        std::fs::create_dir_all(dest).map_err(io_err)?;

        let filename = url_filename(url);
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dest)
            .map_err(io_err)?;

        let total_bytes = self.download(url, &filename, temp.as_file_mut())?;

        let format = if options.extract {
            match ArchiveFormat::from_filename(&filename) {
                Some(format) => Some(format),
                None => ArchiveFormat::sniff(temp.path()).map_err(io_err)?,
            }
        } else {
            None
        };

        match format {
            Some(format) => {
                let files = progress::with_spinner(
                    self.progress,
                    &format!("extracting {}", filename),
                    || extract::extract(temp.path(), dest, format, options.strip_components),
                )
                .map_err(|source| FetchError::Extract {
                    url: url.to_string(),
                    source,
                })?;
                if self.progress {
                    output::detail(&format!(
                        "unpacked {} ({} files)",
                        filename,
                        files.len()
                    ));
                }
                Ok(Fetched::Archive(files))
            }
            None => {
                temp.persist(dest.join(&filename))
                    .map_err(|e| io_err(e.error))?;
                if self.progress {
                    output::detail(&format!("downloaded {} ({} bytes)", filename, total_bytes));
                }
                Ok(Fetched::RawFile)
            }
        }
    }

    /// Stream the response body of `url` into `file`.
    fn download(&self, url: &str, filename: &str, file: &mut File) -> Result<u64, FetchError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent.get(url).call().map_err(|e| http_error(url, e))?;

        let pb = if self.progress {
            progress::create_spinner(&format!("downloading {}", filename))
        } else {
            progress::hidden()
        };
        let _guard = ProgressGuard::new(&pb);

        if let Some(len) = response
            .header("content-length")
            .and_then(|s| s.parse().ok())
        {
            upgrade_to_bytes(&pb, len);
        }

        let io_err = |source| FetchError::Io {
            url: url.to_string(),
            source,
        };

        let mut reader = response.into_reader();
        let mut buffer = [0u8; 8192];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer).map_err(io_err)?;
            if bytes_read == 0 {
                break;
            }
            file.write_all(&buffer[..bytes_read]).map_err(io_err)?;
            total_bytes += bytes_read as u64;
            pb.set_position(total_bytes);
        }

        file.flush().map_err(io_err)?;
        Ok(total_bytes)
    }
}

fn http_error(url: &str, err: ureq::Error) -> FetchError {
    let message = match err {
        ureq::Error::Status(code, _) => format!("server responded with status {}", code),
        other => other.to_string(),
    };
    FetchError::Http {
        url: url.to_string(),
        message,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &FetchOptions,
    ) -> Result<Fetched, FetchError> {
        let fetcher = self.clone();
        let owned_url = url.to_string();
        let dest = dest_dir.to_path_buf();
        let options = *options;

        tokio::task::spawn_blocking(move || fetcher.fetch_blocking(&owned_url, &dest, &options))
            .await
            .map_err(|e| FetchError::Task {
                url: url.to_string(),
                message: e.to_string(),
            })?
    }
}
