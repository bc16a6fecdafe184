//! Error types for binary acquisition.

use std::path::PathBuf;
use thiserror::Error;

use crate::capability::extract::ExtractError;
use crate::platform::Platform;

/// Errors surfaced by [`BinaryAcquirer`](crate::BinaryAcquirer).
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("no binary found matching your system ({platform}), it's probably not supported")]
    NoMatchingSource { platform: Platform },

    #[error("the `{}` binary doesn't seem to work correctly", path.display())]
    VerificationFailed { path: PathBuf },

    #[error("{} {actual} doesn't satisfy the version requirement of {expected}", path.display())]
    VersionMismatch {
        path: PathBuf,
        actual: String,
        expected: String,
    },

    /// A stat failure other than "not found". [`run`](crate::BinaryAcquirer::run)
    /// reports this through [`RunReport`](crate::RunReport) instead of failing.
    #[error("cannot stat {}: {source}", path.display())]
    StatAnomaly {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chmod failed for {}: {source}", path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot run {}: {source}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Version(VersionError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl From<VersionError> for AcquireError {
    fn from(err: VersionError) -> Self {
        match err {
            VersionError::Mismatch {
                path,
                actual,
                range,
            } => AcquireError::VersionMismatch {
                path,
                actual,
                expected: range,
            },
            other => AcquireError::Version(other),
        }
    }
}

/// Errors raised by a [`Fetcher`](crate::capability::Fetcher).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("download failed for {url}: {message}")]
    Http { url: String, message: String },

    #[error("IO error while fetching {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot unpack {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("fetch task for {url} failed: {message}")]
    Task { url: String, message: String },
}

/// Errors raised by [`Verifier::check_version`](crate::capability::Verifier::check_version).
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("invalid version range '{range}': {source}")]
    InvalidRange {
        range: String,
        #[source]
        source: semver::Error,
    },

    #[error("{} {actual} doesn't satisfy the version requirement of {range}", path.display())]
    Mismatch {
        path: PathBuf,
        actual: String,
        range: String,
    },

    #[error("cannot find a version number in the output of {}: {output}", path.display())]
    Undetected { path: PathBuf, output: String },

    #[error("couldn't find the `{}` binary, make sure it's installed: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {code:?} while reporting its version", path.display())]
    Failed { path: PathBuf, code: Option<i32> },
}
