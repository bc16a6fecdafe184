//! Filesystem primitives on `tokio::fs`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{FileStat, Filesystem};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFilesystem;

#[async_trait]
impl Filesystem for TokioFilesystem {
    async fn stat(&self, path: &Path) -> std::io::Result<FileStat> {
        let md = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            is_file: md.is_file(),
            is_dir: md.is_dir(),
            len: md.len(),
            mode: unix_mode(&md),
        })
    }

    async fn set_mode(&self, path: &Path, mode: u32) -> std::io::Result<()> {
        set_mode(path, mode).await
    }

    async fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn set_mode(path: &Path, _mode: u32) -> std::io::Result<()> {
    // No permission bits to set; still fail for a missing file
    tokio::fs::metadata(path).await.map(|_| ())
}

#[cfg(unix)]
fn unix_mode(md: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(md.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_md: &std::fs::Metadata) -> Option<u32> {
    None
}
