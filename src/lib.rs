//! Platform-aware binary acquisition
//!
//! Makes sure an executable is present and working before a program relies on
//! it. Each binary is described by an [`AcquisitionSpec`]: a list of download
//! sources filtered by operating system and architecture, a destination
//! directory, the binary's filename and an optional version range.
//!
//! [`BinaryAcquirer::run`] then:
//!
//! 1. resolves the binary, preferring one already on `PATH`;
//! 2. downloads every source matching the platform when it is missing,
//!    unpacking archives and marking the files executable;
//! 3. runs the binary to check that it works and reports a version inside
//!    the range.
//!
//! # Example
//!
//! ```no_run
//! use bin_acquire::{AcquisitionSpec, BinaryAcquirer};
//!
//! # async fn demo() -> Result<(), bin_acquire::AcquireError> {
//! let spec = AcquisitionSpec::builder()
//!     .source_for("https://example.com/gifsicle-macos.tar.gz", Some("darwin"), None)
//!     .source_for("https://example.com/gifsicle-linux.tar.gz", Some("linux"), Some("x64"))
//!     .source_for("https://example.com/gifsicle-win.zip", Some("win32"), None)
//!     .destination("vendor")
//!     .binary_name("gifsicle")
//!     .version_range(">=1.71")
//!     .build()?;
//!
//! let report = BinaryAcquirer::new(spec).run(&["--version"]).await?;
//! assert!(report.verified);
//! # Ok(())
//! # }
//! ```
//!
//! # Collaborators
//!
//! PATH lookup, downloading, process execution and filesystem access go
//! through the traits in [`capability`]. The defaults use `which`, `ureq`,
//! `tokio::process` and `tokio::fs`; any of them can be replaced.
//!
//! # Environment
//!
//! - `BIN_ACQUIRE_HTTP_TIMEOUT` - download timeout in seconds (default 30)
//! - `BIN_ACQUIRE_MANIFEST` - manifest used by the `bin-acquire` CLI

pub mod acquirer;
pub mod capability;
pub mod core;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod spec;
mod util;

pub use acquirer::{BinaryAcquirer, RunReport};
pub use error::{AcquireError, FetchError, VersionError};
pub use manifest::Manifest;
pub use platform::Platform;
pub use spec::{AcquireOptions, AcquisitionSpec, AcquisitionSpecBuilder, SourceEntry, VerifyPolicy};
