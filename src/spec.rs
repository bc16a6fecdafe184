//! Acquisition configuration.
//!
//! An [`AcquisitionSpec`] is an immutable value produced by
//! [`AcquisitionSpecBuilder`]. To change a live configuration, reopen it with
//! [`AcquisitionSpec::to_builder`], adjust it and build again.
//!
//! ```
//! use bin_acquire::AcquisitionSpec;
//!
//! let spec = AcquisitionSpec::builder()
//!     .source_for("https://example.com/tool-macos.tar.gz", Some("darwin"), None)
//!     .source_for("https://example.com/tool-linux.tar.gz", Some("linux"), Some("x64"))
//!     .destination("vendor")
//!     .binary_name("tool")
//!     .version_range(">=1.2")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(spec.sources().len(), 2);
//! assert_eq!(spec.options().strip_components, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AcquireError;

/// Strip count used when none is configured.
pub const DEFAULT_STRIP_COMPONENTS: u32 = 1;

/// One platform-specific download candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

impl SourceEntry {
    /// An entry usable on every platform.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            os: None,
            arch: None,
        }
    }

    /// Restrict the entry to an operating system.
    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    /// Restrict the entry to an architecture.
    pub fn arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }
}

/// How a present binary is checked after acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerifyPolicy {
    /// Run the executability probe, then the version check when a range is set.
    #[serde(rename = "probe-then-version")]
    ProbeThenVersion,
    /// With a range set, the version check is the only check.
    #[default]
    #[serde(rename = "version-only")]
    VersionOnlyWhenRangeSet,
}

/// Behavioral options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Leading path segments removed from archive entries.
    pub strip_components: u32,
    /// Skip verification entirely.
    pub skip_check: bool,
    pub verify_policy: VerifyPolicy,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            strip_components: DEFAULT_STRIP_COMPONENTS,
            skip_check: false,
            verify_policy: VerifyPolicy::default(),
        }
    }
}

impl AcquireOptions {
    /// Options from raw, possibly-missing values.
    pub fn new(strip: Option<i64>, skip_check: bool) -> Self {
        Self {
            strip_components: normalize_strip(strip),
            skip_check,
            ..Default::default()
        }
    }
}

/// Normalize a strip count: `None` becomes 1, anything `<= 0` becomes 0.
pub fn normalize_strip(strip: Option<i64>) -> u32 {
    match strip {
        None => DEFAULT_STRIP_COMPONENTS,
        Some(n) if n <= 0 => 0,
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
    }
}

/// Everything needed to locate, acquire and check one binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionSpec {
    sources: Vec<SourceEntry>,
    destination: PathBuf,
    binary_name: String,
    version_range: Option<String>,
    options: AcquireOptions,
}

impl AcquisitionSpec {
    pub fn builder() -> AcquisitionSpecBuilder {
        AcquisitionSpecBuilder::default()
    }

    /// Reopen this spec for changes. Sources are kept; new ones append.
    pub fn to_builder(&self) -> AcquisitionSpecBuilder {
        AcquisitionSpecBuilder {
            sources: self.sources.clone(),
            destination: Some(self.destination.clone()),
            binary_name: Some(self.binary_name.clone()),
            version_range: self.version_range.clone(),
            options: self.options,
        }
    }

    /// Configured sources in insertion order.
    pub fn sources(&self) -> &[SourceEntry] {
        &self.sources
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn version_range(&self) -> Option<&str> {
        self.version_range.as_deref()
    }

    pub fn options(&self) -> &AcquireOptions {
        &self.options
    }

    /// `destination/binary_name`, ignoring any PATH lookup.
    pub fn destination_path(&self) -> PathBuf {
        self.destination.join(&self.binary_name)
    }
}

/// Builder for [`AcquisitionSpec`]. Setters chain; the last write wins.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionSpecBuilder {
    sources: Vec<SourceEntry>,
    destination: Option<PathBuf>,
    binary_name: Option<String>,
    version_range: Option<String>,
    options: AcquireOptions,
}

impl AcquisitionSpecBuilder {
    /// Append a source usable on every platform.
    pub fn source(self, url: impl Into<String>) -> Self {
        self.push_source(SourceEntry::new(url))
    }

    /// Append a source restricted by optional os and arch filters.
    pub fn source_for(self, url: impl Into<String>, os: Option<&str>, arch: Option<&str>) -> Self {
        self.push_source(SourceEntry {
            url: url.into(),
            os: os.map(str::to_string),
            arch: arch.map(str::to_string),
        })
    }

    pub fn push_source(mut self, entry: SourceEntry) -> Self {
        self.sources.push(entry);
        self
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    pub fn binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = Some(name.into());
        self
    }

    pub fn version_range(mut self, range: impl Into<String>) -> Self {
        self.version_range = Some(range.into());
        self
    }

    /// Drop a previously configured version range.
    pub fn clear_version_range(mut self) -> Self {
        self.version_range = None;
        self
    }

    /// Set the strip count; negative values become 0.
    pub fn strip_components(mut self, strip: i64) -> Self {
        self.options.strip_components = normalize_strip(Some(strip));
        self
    }

    pub fn skip_check(mut self, skip: bool) -> Self {
        self.options.skip_check = skip;
        self
    }

    pub fn verify_policy(mut self, policy: VerifyPolicy) -> Self {
        self.options.verify_policy = policy;
        self
    }

    pub fn options(mut self, options: AcquireOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<AcquisitionSpec, AcquireError> {
        let destination = self
            .destination
            .ok_or(AcquireError::MissingField("destination"))?;
        let binary_name = self
            .binary_name
            .filter(|name| !name.is_empty())
            .ok_or(AcquireError::MissingField("binary_name"))?;

        Ok(AcquisitionSpec {
            sources: self.sources,
            destination,
            binary_name,
            version_range: self.version_range,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AcquisitionSpecBuilder {
        AcquisitionSpec::builder().destination("tmp").binary_name("foo")
    }

    #[test]
    fn test_sources_keep_insertion_order_and_filters() {
        let spec = base()
            .source("http://example.com/bar.tar.gz")
            .source_for("http://example.com/mac.tar.gz", Some("darwin"), None)
            .source_for("http://example.com/win.zip", Some("win32"), Some("x64"))
            .build()
            .unwrap();

        assert_eq!(
            spec.sources(),
            &[
                SourceEntry::new("http://example.com/bar.tar.gz"),
                SourceEntry::new("http://example.com/mac.tar.gz").os("darwin"),
                SourceEntry::new("http://example.com/win.zip")
                    .os("win32")
                    .arch("x64"),
            ]
        );
    }

    #[test]
    fn test_no_sources_is_an_empty_slice() {
        let spec = base().build().unwrap();
        assert!(spec.sources().is_empty());
    }

    #[test]
    fn test_strip_normalization() {
        assert_eq!(normalize_strip(None), 1);
        assert_eq!(normalize_strip(Some(0)), 0);
        assert_eq!(normalize_strip(Some(-3)), 0);
        assert_eq!(normalize_strip(Some(2)), 2);
        assert_eq!(AcquireOptions::new(Some(-1), false).strip_components, 0);
        assert_eq!(AcquireOptions::new(None, true).strip_components, 1);
    }

    #[test]
    fn test_builder_strip_setter_normalizes() {
        let spec = base().strip_components(-5).build().unwrap();
        assert_eq!(spec.options().strip_components, 0);

        let spec = base().strip_components(3).build().unwrap();
        assert_eq!(spec.options().strip_components, 3);
    }

    #[test]
    fn test_defaults() {
        let spec = base().build().unwrap();
        assert_eq!(spec.options().strip_components, DEFAULT_STRIP_COMPONENTS);
        assert!(!spec.options().skip_check);
        assert_eq!(
            spec.options().verify_policy,
            VerifyPolicy::VersionOnlyWhenRangeSet
        );
        assert_eq!(spec.version_range(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let spec = base()
            .destination("first")
            .destination("second")
            .binary_name("a")
            .binary_name("b")
            .version_range("1.0.0")
            .version_range(">=2")
            .build()
            .unwrap();

        assert_eq!(spec.destination(), Path::new("second"));
        assert_eq!(spec.binary_name(), "b");
        assert_eq!(spec.version_range(), Some(">=2"));
    }

    #[test]
    fn test_destination_path_joins() {
        let spec = base().build().unwrap();
        assert_eq!(spec.destination_path(), Path::new("tmp").join("foo"));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let err = AcquisitionSpec::builder().binary_name("foo").build().unwrap_err();
        assert!(matches!(err, AcquireError::MissingField("destination")));

        let err = AcquisitionSpec::builder().destination("tmp").build().unwrap_err();
        assert!(matches!(err, AcquireError::MissingField("binary_name")));

        let err = base().binary_name("").build().unwrap_err();
        assert!(matches!(err, AcquireError::MissingField("binary_name")));
    }

    #[test]
    fn test_to_builder_round_trips_and_appends() {
        let spec = base().source("http://example.com/a").build().unwrap();
        let reopened = spec.to_builder().build().unwrap();
        assert_eq!(reopened, spec);

        let extended = spec
            .to_builder()
            .source("http://example.com/b")
            .clear_version_range()
            .build()
            .unwrap();
        assert_eq!(extended.sources().len(), 2);
        assert_eq!(extended.sources()[0].url, "http://example.com/a");
    }

    #[test]
    fn test_policy_names_in_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: VerifyPolicy,
        }

        let w: Wrapper = toml::from_str(r#"policy = "probe-then-version""#).unwrap();
        assert_eq!(w.policy, VerifyPolicy::ProbeThenVersion);
        let w: Wrapper = toml::from_str(r#"policy = "version-only""#).unwrap();
        assert_eq!(w.policy, VerifyPolicy::VersionOnlyWhenRangeSet);
    }
}
