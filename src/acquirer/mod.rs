//! The acquisition workflow.
//!
//! [`BinaryAcquirer::run`] goes through two phases:
//!
//! 1. **Presence** - stat the resolved path; when nothing is there, download
//!    every source matching the platform ([`download`]).
//! 2. **Verification** - unless `skip_check` is set, run the binary
//!    ([`verify`]).
//!
//! Nothing is cached between runs: each run re-resolves the path and checks
//! the filesystem again.

pub mod download;
pub mod verify;

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::capability::{
    Fetcher, Filesystem, HttpFetcher, Locator, PathLocator, ProcessVerifier, TokioFilesystem,
    Verifier,
};
use crate::core::output;
use crate::error::AcquireError;
use crate::platform::Platform;
use crate::spec::{AcquisitionSpec, SourceEntry};

/// Arguments [`BinaryAcquirer::run_default`] passes to the binary.
pub const DEFAULT_TEST_ARGS: &[&str] = &["--version"];

/// Outcome of a successful [`BinaryAcquirer::run`].
#[derive(Debug)]
pub struct RunReport {
    /// Where the binary was looked for and verified.
    pub resolved_path: PathBuf,
    /// Files written by this run; empty when the binary was already present.
    pub downloaded: Vec<PathBuf>,
    /// Whether verification ran and passed.
    pub verified: bool,
    /// A stat failure other than "not found". The run continued as though
    /// the binary were present.
    pub stat_anomaly: Option<AcquireError>,
}

impl RunReport {
    pub fn was_downloaded(&self) -> bool {
        !self.downloaded.is_empty()
    }
}

/// Ensures a binary is present and working.
///
/// # Example
///
/// ```no_run
/// use bin_acquire::{AcquisitionSpec, BinaryAcquirer};
///
/// # async fn demo() -> Result<(), bin_acquire::AcquireError> {
/// let spec = AcquisitionSpec::builder()
///     .source_for("https://example.com/tool-macos.tar.gz", Some("darwin"), None)
///     .source_for("https://example.com/tool-linux.tar.gz", Some("linux"), Some("x64"))
///     .destination("vendor")
///     .binary_name("tool")
///     .version_range(">=1.2")
///     .build()?;
///
/// let report = BinaryAcquirer::new(spec).run_default().await?;
/// println!("{}", report.resolved_path.display());
/// # Ok(())
/// # }
/// ```
pub struct BinaryAcquirer {
    spec: AcquisitionSpec,
    platform: Platform,
    locator: Box<dyn Locator>,
    fetcher: Box<dyn Fetcher>,
    verifier: Box<dyn Verifier>,
    fs: Box<dyn Filesystem>,
    verbose: bool,
}

impl BinaryAcquirer {
    /// An acquirer for the current platform with the default collaborators.
    pub fn new(spec: AcquisitionSpec) -> Self {
        Self {
            spec,
            platform: Platform::current(),
            locator: Box::new(PathLocator),
            fetcher: Box::new(HttpFetcher::new()),
            verifier: Box::new(ProcessVerifier),
            fs: Box::new(TokioFilesystem),
            verbose: false,
        }
    }

    pub fn with_locator(mut self, locator: impl Locator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_verifier(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    pub fn with_filesystem(mut self, fs: impl Filesystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// Select sources for `platform` instead of the host.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Print progress lines while running.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn spec(&self) -> &AcquisitionSpec {
        &self.spec
    }

    /// Replace the configuration; the next run uses it.
    pub fn set_spec(&mut self, spec: AcquisitionSpec) {
        self.spec = spec;
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The binary on PATH if the locator finds it, else
    /// `destination/binary_name`. Evaluated on every call.
    pub fn resolved_path(&self) -> PathBuf {
        self.locator
            .find(self.spec.binary_name())
            .unwrap_or_else(|| self.spec.destination_path())
    }

    /// Sources that apply to this acquirer's platform, in order.
    pub fn matching_sources(&self) -> Vec<&SourceEntry> {
        self.platform.filter(self.spec.sources())
    }

    /// [`run`](Self::run) with [`DEFAULT_TEST_ARGS`].
    pub async fn run_default(&self) -> Result<RunReport, AcquireError> {
        self.run(DEFAULT_TEST_ARGS).await
    }

    /// Make sure the binary is present, downloading it if needed, then
    /// verify it by running it with `test_args`.
    pub async fn run<S: AsRef<str>>(&self, test_args: &[S]) -> Result<RunReport, AcquireError> {
        let test_args: Vec<String> = test_args.iter().map(|a| a.as_ref().to_string()).collect();
        let path = self.resolved_path();

        let mut report = RunReport {
            resolved_path: path.clone(),
            downloaded: Vec::new(),
            verified: false,
            stat_anomaly: None,
        };

        match self.fs.stat(&path).await {
            Ok(_) => {
                if self.verbose {
                    output::skip(&format!("{} already present", path.display()));
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.verbose {
                    output::action(&format!("downloading {}", self.spec.binary_name()));
                }
                report.downloaded = download::download(
                    &self.spec,
                    &self.platform,
                    self.fetcher.as_ref(),
                    self.fs.as_ref(),
                    self.verbose,
                )
                .await?;
                report.resolved_path = self.resolved_path();
            }
            Err(source) => {
                if self.verbose {
                    output::warning(&format!("cannot stat {}: {}", path.display(), source));
                }
                report.stat_anomaly = Some(AcquireError::StatAnomaly { path, source });
            }
        }

        let options = self.spec.options();
        if options.skip_check {
            if self.verbose {
                output::skip("verification skipped");
            }
            return Ok(report);
        }

        verify::verify(
            &report.resolved_path,
            self.spec.version_range(),
            options.verify_policy,
            &test_args,
            self.verifier.as_ref(),
        )
        .await?;
        report.verified = true;

        if self.verbose {
            output::success(&format!("{} works", report.resolved_path.display()));
        }

        Ok(report)
    }
}

impl std::fmt::Debug for BinaryAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryAcquirer")
            .field("spec", &self.spec)
            .field("platform", &self.platform)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
