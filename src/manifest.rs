//! TOML manifest describing one binary to acquire.
//!
//! ```toml
//! binary = "gifsicle"
//! destination = "vendor"
//! version = ">=1.71"
//! strip = 1
//! policy = "version-only"
//!
//! [[source]]
//! url = "https://example.com/gifsicle-macos.tar.gz"
//! os = "darwin"
//!
//! [[source]]
//! url = "https://example.com/gifsicle-linux.tar.gz"
//! os = "linux"
//! arch = "x64"
//! ```
//!
//! A relative `destination` is taken relative to the manifest's directory.
//! Without one, binaries go to the user cache directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::acquirer::DEFAULT_TEST_ARGS;
use crate::error::AcquireError;
use crate::spec::{AcquireOptions, AcquisitionSpec, SourceEntry, VerifyPolicy, normalize_strip};

/// Manifest file name looked up when none is given.
pub const DEFAULT_MANIFEST: &str = "bin-acquire.toml";

/// Environment variable naming the manifest file.
pub const MANIFEST_ENV: &str = "BIN_ACQUIRE_MANIFEST";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub binary: String,
    #[serde(default)]
    pub destination: Option<PathBuf>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub strip: Option<i64>,
    #[serde(default)]
    pub skip_check: bool,
    #[serde(default)]
    pub policy: VerifyPolicy,
    #[serde(default)]
    pub test_args: Option<Vec<String>>,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Manifest {
    /// Parse manifest text; relative destinations resolve against `base_dir`.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(contents).context("invalid manifest")?;
        manifest.base_dir = base_dir.to_path_buf();
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest {}", path.display()))?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Self::parse(&contents, base_dir).with_context(|| format!("in {}", path.display()))
    }

    /// Directory the binary is acquired into.
    pub fn destination(&self) -> PathBuf {
        match &self.destination {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.base_dir.join(dir),
            None => default_destination(&self.binary),
        }
    }

    /// Arguments used to verify the binary.
    pub fn test_args(&self) -> Vec<String> {
        match &self.test_args {
            Some(args) => args.clone(),
            None => DEFAULT_TEST_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn to_spec(&self) -> Result<AcquisitionSpec, AcquireError> {
        let options = AcquireOptions {
            strip_components: normalize_strip(self.strip),
            skip_check: self.skip_check,
            verify_policy: self.policy,
        };

        let mut builder = AcquisitionSpec::builder()
            .destination(self.destination())
            .binary_name(self.binary.as_str())
            .options(options);
        for source in &self.sources {
            builder = builder.push_source(source.clone());
        }
        if let Some(range) = &self.version {
            builder = builder.version_range(range.as_str());
        }
        builder.build()
    }
}

/// `<cache dir>/bin-acquire/<binary>`, falling back to the temp directory.
pub fn default_destination(binary: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("bin-acquire")
        .join(binary)
}
