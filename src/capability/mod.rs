//! Collaborators the acquirer drives.
//!
//! Each capability is a trait with a default implementation:
//!
//! - [`Locator`]: find a binary on PATH ([`PathLocator`], [`NoLocator`])
//! - [`Fetcher`]: download a URL, unpacking archives ([`HttpFetcher`])
//! - [`Verifier`]: probe a binary and check its version ([`ProcessVerifier`])
//! - [`Filesystem`]: stat, chmod, list ([`TokioFilesystem`])
//!
//! Tests and embedders swap any of them out on
//! [`BinaryAcquirer`](crate::BinaryAcquirer).

pub mod extract;
pub mod fetch;
pub mod fs;
pub mod locate;
pub mod verify;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, VersionError};

pub use fetch::HttpFetcher;
pub use fs::TokioFilesystem;
pub use locate::{NoLocator, PathLocator};
pub use verify::ProcessVerifier;

/// What a fetch left in the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// An archive was unpacked; paths are relative to the destination.
    Archive(Vec<PathBuf>),
    /// The payload was written as-is, named after the URL's last path segment.
    RawFile,
}

/// Options passed to [`Fetcher::fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Unpack recognized archives instead of saving them.
    pub extract: bool,
    /// Leading path segments removed from each archive entry.
    pub strip_components: u32,
}

/// The parts of file metadata the acquirer and CLI look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_file: bool,
    pub is_dir: bool,
    pub len: u64,
    /// Unix permission bits, when the platform has them.
    pub mode: Option<u32>,
}

impl FileStat {
    /// Whether owner, group and other may all execute the file.
    pub fn is_executable_by_all(&self) -> bool {
        self.mode.is_some_and(|mode| mode & 0o111 == 0o111)
    }
}

/// PATH lookup. Must not fail: "not found" is `None`.
pub trait Locator: Send + Sync {
    fn find(&self, name: &str) -> Option<PathBuf>;
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest_dir`, creating or overwriting files there.
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &FetchOptions,
    ) -> Result<Fetched, FetchError>;
}

#[async_trait]
pub trait Verifier: Send + Sync {
    /// Run `path` with `args`; `Ok(true)` when it exits successfully.
    ///
    /// Errors only when the process cannot be started.
    async fn check_works(&self, path: &Path, args: &[String]) -> std::io::Result<bool>;

    /// Check the version `path` reports against `range`.
    ///
    /// `args` overrides the arguments used to ask for the version; `None`
    /// uses the verifier's own default.
    async fn check_version(
        &self,
        path: &Path,
        range: &str,
        args: Option<&[String]>,
    ) -> Result<(), VersionError>;
}

#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Metadata for `path`; a missing file is `ErrorKind::NotFound`.
    async fn stat(&self, path: &Path) -> std::io::Result<FileStat>;

    async fn set_mode(&self, path: &Path, mode: u32) -> std::io::Result<()>;

    /// Entries of `dir`, sorted by path.
    async fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_by_all() {
        let stat = |mode| FileStat {
            is_file: true,
            is_dir: false,
            len: 0,
            mode,
        };
        assert!(stat(Some(0o755)).is_executable_by_all());
        assert!(stat(Some(0o100755)).is_executable_by_all());
        assert!(!stat(Some(0o744)).is_executable_by_all());
        assert!(!stat(Some(0o644)).is_executable_by_all());
        assert!(!stat(None).is_executable_by_all());
    }
}
