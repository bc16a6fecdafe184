//! Version ranges and version scraping
//!
//! Ranges are written the way package manifests usually write them:
//!
//! ```text
//! "1.2.3"                 exact version
//! ">=1.71"                minimum version
//! ">=1.0.0 <2.0.0"        space-separated comparators
//! ">= 1.0, < 2.0"         comma-separated comparators
//! "^1.2" / "~1.2"         compatible / patch-level
//! "1.2.3 - 2.3.4"         inclusive hyphen range
//! "^1.0 || ^2.0"          alternatives
//! ```
//!
//! A bare version means exactly that version, unlike the `semver` crate where
//! a bare version is a caret requirement.

use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// A parsed version range: any alternative may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(range: &str) -> Result<Self, semver::Error> {
        let alternatives = range
            .split("||")
            .map(parse_alternative)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: range.trim().to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The range as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for VersionRange {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_alternative(alternative: &str) -> Result<VersionReq, semver::Error> {
    let alternative = alternative.trim();

    if let Some((low, high)) = alternative.split_once(" - ") {
        return VersionReq::parse(&format!(
            ">={}, <={}",
            strip_v(low.trim()),
            strip_v(high.trim())
        ));
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in alternative
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        // A lone operator applies to the next token: ">= 1.0"
        if token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending_op = Some(token);
            continue;
        }

        let split = token
            .find(|c: char| !OPERATOR_CHARS.contains(&c))
            .unwrap_or(token.len());
        let (op, version) = token.split_at(split);
        let op = if op.is_empty() {
            pending_op.take().unwrap_or("")
        } else {
            pending_op = None;
            op
        };
        let version = strip_v(version);

        let comparator = if is_wildcard(version) {
            "*".to_string()
        } else if op.is_empty() {
            format!("={}", version)
        } else {
            format!("{}{}", op, version)
        };
        comparators.push(comparator);
    }

    if let Some(op) = pending_op {
        comparators.push(op.to_string());
    }

    if comparators.is_empty() {
        return Ok(VersionReq::STAR);
    }

    VersionReq::parse(&comparators.join(", "))
}

fn strip_v(version: &str) -> &str {
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

fn is_wildcard(version: &str) -> bool {
    matches!(version, "*" | "x" | "X")
}

/// Find the first version number in a program's output.
///
/// Accepts partial versions ("1.71" becomes 1.71.0) and a leading "v".
pub fn find_version(output: &str) -> Option<Version> {
    output
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | '[' | ']' | '"' | '\''))
        .filter_map(version_candidate)
        .find_map(|candidate| Version::parse(&pad_version(&candidate)).ok())
}

/// Extract the version-shaped prefix of a token: "v1.2.3-rc1," -> "1.2.3-rc1"
fn version_candidate(token: &str) -> Option<String> {
    let token = strip_v(token);
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let core_len = token
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(token.len());
    let core = token[..core_len].trim_end_matches('.');
    if !core.contains('.') || core.split('.').count() > 3 {
        return None;
    }

    // Keep a pre-release or build suffix only when the core is complete
    let rest = &token[core_len..];
    let suffix: String = if core.split('.').count() == 3 && (rest.starts_with('-') || rest.starts_with('+')) {
        rest.chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.'))
            .collect::<String>()
            .trim_end_matches('.')
            .to_string()
    } else {
        String::new()
    };

    Some(format!("{}{}", core, suffix))
}

/// Pad a version string to be semver-compatible (X.Y.Z)
fn pad_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    }
}
