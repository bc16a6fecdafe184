//! Fake collaborators for acquirer tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bin_acquire::capability::{
    FetchOptions, Fetched, Fetcher, FileStat, Filesystem, Locator, TokioFilesystem, Verifier,
};
use bin_acquire::core::version::{VersionRange, find_version};
use bin_acquire::{FetchError, VersionError};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What the fake fetcher leaves behind for a URL.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Files written under the destination, reported as an archive manifest.
    Archive(Vec<(&'static str, &'static str)>),
    /// A single file named after the last URL segment.
    Raw(&'static str),
    /// The fetch fails.
    Fail(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub url: String,
    pub dest: PathBuf,
    pub options: FetchOptions,
}

#[derive(Clone, Default)]
pub struct FakeFetcher {
    responses: Arc<HashMap<String, FakeResponse>>,
    calls: Arc<Mutex<Vec<FetchCall>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, response: FakeResponse) -> Self {
        Arc::make_mut(&mut self.responses).insert(url.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }
}

/// Last path segment, without query string or fragment.
fn last_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        options: &FetchOptions,
    ) -> Result<Fetched, FetchError> {
        self.calls.lock().unwrap().push(FetchCall {
            url: url.to_string(),
            dest: dest_dir.to_path_buf(),
            options: *options,
        });

        let io_err = |source| FetchError::Io {
            url: url.to_string(),
            source,
        };
        std::fs::create_dir_all(dest_dir).map_err(io_err)?;

        let response = self
            .responses
            .get(url)
            .cloned()
            .unwrap_or(FakeResponse::Raw("#!/bin/sh\necho 1.0.0\n"));

        match response {
            FakeResponse::Archive(files) => {
                let mut manifest = Vec::new();
                for (name, content) in files {
                    let path = dest_dir.join(name);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).map_err(io_err)?;
                    }
                    std::fs::write(&path, content).map_err(io_err)?;
                    manifest.push(PathBuf::from(name));
                }
                Ok(Fetched::Archive(manifest))
            }
            FakeResponse::Raw(content) => {
                std::fs::write(dest_dir.join(last_segment(url)), content).map_err(io_err)?;
                Ok(Fetched::RawFile)
            }
            FakeResponse::Fail(message) => Err(FetchError::Http {
                url: url.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCall {
    pub path: PathBuf,
    pub range: String,
    pub args: Option<Vec<String>>,
}

/// Verifier with a canned probe result and reported version.
#[derive(Clone)]
pub struct FakeVerifier {
    works: bool,
    version: String,
    probes: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    version_checks: Arc<Mutex<Vec<VersionCall>>>,
}

impl FakeVerifier {
    pub fn new() -> Self {
        Self {
            works: true,
            version: "1.0.0".to_string(),
            probes: Arc::default(),
            version_checks: Arc::default(),
        }
    }

    pub fn broken() -> Self {
        Self {
            works: false,
            ..Self::new()
        }
    }

    pub fn reporting(version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..Self::new()
        }
    }

    pub fn probes(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.probes.lock().unwrap().clone()
    }

    pub fn version_checks(&self) -> Vec<VersionCall> {
        self.version_checks.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.probes().len() + self.version_checks().len()
    }
}

#[async_trait]
impl Verifier for FakeVerifier {
    async fn check_works(&self, path: &Path, args: &[String]) -> io::Result<bool> {
        self.probes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), args.to_vec()));
        Ok(self.works)
    }

    async fn check_version(
        &self,
        path: &Path,
        range: &str,
        args: Option<&[String]>,
    ) -> Result<(), VersionError> {
        self.version_checks.lock().unwrap().push(VersionCall {
            path: path.to_path_buf(),
            range: range.to_string(),
            args: args.map(<[String]>::to_vec),
        });

        let parsed = VersionRange::parse(range).map_err(|source| VersionError::InvalidRange {
            range: range.to_string(),
            source,
        })?;
        let version = find_version(&self.version).ok_or_else(|| VersionError::Undetected {
            path: path.to_path_buf(),
            output: self.version.clone(),
        })?;

        if parsed.matches(&version) {
            Ok(())
        } else {
            Err(VersionError::Mismatch {
                path: path.to_path_buf(),
                actual: version.to_string(),
                range: range.to_string(),
            })
        }
    }
}

/// Locator that always answers the same way.
pub struct FixedLocator(pub Option<PathBuf>);

impl Locator for FixedLocator {
    fn find(&self, _name: &str) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Real filesystem, except `stat` of one path fails with `PermissionDenied`.
pub struct UnreadableFs {
    pub path: PathBuf,
}

#[async_trait]
impl Filesystem for UnreadableFs {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        if path == self.path {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        TokioFilesystem.stat(path).await
    }

    async fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        TokioFilesystem.set_mode(path, mode).await
    }

    async fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        TokioFilesystem.read_dir(dir).await
    }
}

/// Real filesystem whose chmod always fails.
pub struct ReadOnlyFs;

#[async_trait]
impl Filesystem for ReadOnlyFs {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        TokioFilesystem.stat(path).await
    }

    async fn set_mode(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    async fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        TokioFilesystem.read_dir(dir).await
    }
}
