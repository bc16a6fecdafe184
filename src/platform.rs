//! Platform identification and source filtering.
//!
//! Source entries may name platforms the way Node does (`darwin`, `win32`,
//! `x64`) or the way Rust does (`macos`, `windows`, `x86_64`). Both sides of
//! a comparison are normalized, so either spelling matches.

use std::fmt;

use crate::spec::SourceEntry;

/// An operating system / architecture pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Build a platform from any accepted spelling of os and arch.
    pub fn new(os: impl AsRef<str>, arch: impl AsRef<str>) -> Self {
        Self {
            os: normalize_os(os.as_ref()),
            arch: normalize_arch(arch.as_ref()),
        }
    }

    /// The platform this process was compiled for.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Whether `entry` may be downloaded on this platform.
    ///
    /// Unset filters match anything.
    pub fn matches(&self, entry: &SourceEntry) -> bool {
        let os_ok = entry
            .os
            .as_deref()
            .is_none_or(|os| normalize_os(os) == self.os);
        let arch_ok = entry
            .arch
            .as_deref()
            .is_none_or(|arch| normalize_arch(arch) == self.arch);
        os_ok && arch_ok
    }

    /// Entries usable on this platform, in configuration order.
    pub fn filter<'a>(&self, sources: &'a [SourceEntry]) -> Vec<&'a SourceEntry> {
        sources.iter().filter(|entry| self.matches(entry)).collect()
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> String {
    let os = os.trim().to_lowercase();
    match os.as_str() {
        "darwin" | "macos" | "osx" | "mac" => "macos".to_string(),
        "win32" | "windows" | "win" => "windows".to_string(),
        "sunos" | "solaris" => "solaris".to_string(),
        _ => os,
    }
}

fn normalize_arch(arch: &str) -> String {
    let arch = arch.trim().to_lowercase();
    match arch.as_str() {
        "x64" | "x86_64" | "amd64" => "x86_64".to_string(),
        "ia32" | "x86" | "i386" | "i686" => "x86".to_string(),
        "arm64" | "aarch64" => "aarch64".to_string(),
        "ppc64" | "powerpc64" => "powerpc64".to_string(),
        "ppc" | "powerpc" => "powerpc".to_string(),
        _ => arch,
    }
}
