//! PATH lookup.

use std::path::{Path, PathBuf};

use super::Locator;

/// Finds binaries on the system PATH with the `which` crate.
///
/// Only bare names are looked up. A name containing a path separator is a
/// location under the destination directory, not a PATH entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLocator;

impl Locator for PathLocator {
    fn find(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || Path::new(name).components().count() != 1 {
            return None;
        }
        which::which(name).ok()
    }
}

/// Never finds anything; the destination directory is always used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocator;

impl Locator for NoLocator {
    fn find(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}
