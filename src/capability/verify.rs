//! Running a binary to see whether it works and which version it reports.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::Verifier;
use crate::core::version::{VersionRange, find_version};
use crate::error::VersionError;

/// Arguments used to ask a binary for its version when none are given.
pub const DEFAULT_VERSION_ARGS: &[&str] = &["--version"];

/// Runs binaries as child processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessVerifier;

#[async_trait]
impl Verifier for ProcessVerifier {
    async fn check_works(&self, path: &Path, args: &[String]) -> std::io::Result<bool> {
        let status = Command::new(path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        Ok(status.success())
    }

    async fn check_version(
        &self,
        path: &Path,
        range: &str,
        args: Option<&[String]>,
    ) -> Result<(), VersionError> {
        // Parse first: a bad range is reported without running anything
        let range = VersionRange::parse(range).map_err(|source| VersionError::InvalidRange {
            range: range.to_string(),
            source,
        })?;

        let mut command = Command::new(path);
        match args {
            Some(args) => command.args(args),
            None => command.args(DEFAULT_VERSION_ARGS),
        };

        let output = command
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| VersionError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(VersionError::Failed {
                path: path.to_path_buf(),
                code: output.status.code(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr)
        } else {
            stdout
        };

        let version = find_version(&text).ok_or_else(|| VersionError::Undetected {
            path: path.to_path_buf(),
            output: text.trim().to_string(),
        })?;

        if range.matches(&version) {
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

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_check_works_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ok = script(&dir, "ok", "exit 0");
        let bad = script(&dir, "bad", "exit 3");

        assert!(ProcessVerifier.check_works(&ok, &args(&["--version"])).await.unwrap());
        assert!(!ProcessVerifier.check_works(&bad, &args(&["--version"])).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_works_passes_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(&dir, "tool", r#"[ "$1" = "--help" ] || exit 1"#);

        assert!(ProcessVerifier.check_works(&tool, &args(&["--help"])).await.unwrap());
        assert!(!ProcessVerifier.check_works(&tool, &args(&["--version"])).await.unwrap());
    }

    #[tokio::test]
    async fn test_check_works_missing_binary_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            ProcessVerifier
                .check_works(&dir.path().join("missing"), &[])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_check_version_satisfied() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(&dir, "tool", "echo 'tool version 1.14.2 (build 42)'");

        ProcessVerifier.check_version(&tool, ">=1.14", None).await.unwrap();
        ProcessVerifier.check_version(&tool, "1.14.2", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(&dir, "tool", "echo 'v0.9.1'");

        let err = ProcessVerifier
            .check_version(&tool, ">=1.0.0", None)
            .await
            .unwrap_err();
        match err {
            VersionError::Mismatch { actual, range, .. } => {
                assert_eq!(actual, "0.9.1");
                assert_eq!(range, ">=1.0.0");
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_version_reads_stderr_when_stdout_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(&dir, "tool", "echo 'tool 2.3.0' >&2");

        ProcessVerifier.check_version(&tool, "^2.0.0", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_check_version_custom_args() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(
            &dir,
            "tool",
            r#"if [ "$1" = "-V" ]; then echo 3.1.0; else exit 2; fi"#,
        );

        ProcessVerifier
            .check_version(&tool, ">=3.0", Some(&args(&["-V"])))
            .await
            .unwrap();
        let err = ProcessVerifier.check_version(&tool, ">=3.0", None).await.unwrap_err();
        assert!(matches!(err, VersionError::Failed { code: Some(2), .. }));
    }

    #[tokio::test]
    async fn test_check_version_no_version_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(&dir, "tool", "echo 'no numbers here'");

        let err = ProcessVerifier.check_version(&tool, "*", None).await.unwrap_err();
        assert!(matches!(err, VersionError::Undetected { .. }));
    }

    #[tokio::test]
    async fn test_check_version_invalid_range_does_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let tool = script(&dir, "tool", &format!("touch {}; echo 1.0.0", marker.display()));

        let err = ProcessVerifier
            .check_version(&tool, ">=>=banana", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::InvalidRange { .. }));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_check_version_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessVerifier
            .check_version(&dir.path().join("missing"), "*", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::Spawn { .. }));
    }
}
