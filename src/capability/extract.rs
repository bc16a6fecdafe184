//! Native archive extraction (no external tools needed)
//!
//! Unpacks tar (plain, gz, xz, bz2, zst) and zip archives into a destination
//! directory, removing a number of leading path components from every entry,
//! and reports the regular files it wrote.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Extraction failure; the message names the offending entry or file.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ExtractError(String);

impl From<String> for ExtractError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ExtractError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

type Result<T> = std::result::Result<T, ExtractError>;

// File type bits of a unix mode
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Detect archive format from filename extension
    pub fn from_filename(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Self::TarXz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz")
        {
            Some(Self::TarBz2)
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Some(Self::TarZst)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Detect archive format from the leading bytes of a file.
    ///
    /// Compressed streams are assumed to wrap a tar archive.
    pub fn sniff(path: &Path) -> std::io::Result<Option<Self>> {
        let mut head = Vec::with_capacity(262);
        File::open(path)?.take(262).read_to_end(&mut head)?;
        Ok(Self::from_magic(&head))
    }

    fn from_magic(head: &[u8]) -> Option<Self> {
        if head.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if head.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Self::TarXz)
        } else if head.starts_with(b"BZh") {
            Some(Self::TarBz2)
        } else if head.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Some(Self::TarZst)
        } else if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if head.len() >= 262 && &head[257..262] == b"ustar" {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// Extract `archive` into `dest`, dropping `strip` leading components.
///
/// Returns the regular files written, relative to `dest`, in archive order.
/// Files shallower than `strip` keep their name; directories with no
/// components left after stripping are skipped.
pub fn extract(
    archive: &Path,
    dest: &Path,
    format: ArchiveFormat,
    strip: u32,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest)
        .map_err(|e| format!("cannot create destination directory: {}", e))?;

    let file =
        File::open(archive).map_err(|e| format!("cannot open {}: {}", archive.display(), e))?;
    let reader = BufReader::new(file);
    let strip = strip as usize;

    match format {
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(reader), dest, strip),
        ArchiveFormat::TarXz => extract_tar(xz2::read::XzDecoder::new(reader), dest, strip),
        ArchiveFormat::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(reader), dest, strip),
        ArchiveFormat::TarZst => {
            let decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| format!("zstd init error: {}", e))?;
            extract_tar(decoder, dest, strip)
        }
        ArchiveFormat::Tar => extract_tar(reader, dest, strip),
        ArchiveFormat::Zip => extract_zip(reader, dest, strip),
    }
}

/// Remove up to `strip` leading normal components.
///
/// A file always keeps its final component, so `tool` stays `tool` however
/// deep the strip. Directories may be stripped away entirely (`None`).
fn strip_path(path: &Path, strip: usize, is_dir: bool) -> Option<PathBuf> {
    let parts: Vec<_> = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    let skip = if is_dir {
        strip
    } else {
        strip.min(parts.len().saturating_sub(1))
    };
    let stripped: PathBuf = parts.into_iter().skip(skip).collect();
    (!stripped.as_os_str().is_empty()).then_some(stripped)
}

fn is_safe_path(path: &Path) -> bool {
    !path.is_absolute()
        && !path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

fn normalize_lexical(path: &Path) -> PathBuf {
    // Lexically normalize a path (no filesystem access). This is used to
    // validate link targets without following symlinks.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    // Preserve leading ".." for relative paths.
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> Result<()> {
    let rel = full_path.strip_prefix(dest).map_err(|_| {
        format!(
            "archive contains path outside destination: {}",
            full_path.display()
        )
    })?;

    // Reject if any existing path component (including leaf) is a symlink.
    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(format!(
                "extraction blocked: symlink in path component: {}",
                cur.display()
            )
            .into());
        }
    }

    Ok(())
}

fn ensure_link_target_within_dest(dest: &Path, link_parent: &Path, link_name: &Path) -> Result<()> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(format!(
            "archive contains unsafe link target (absolute): {}",
            link_name.display()
        )
        .into());
    }

    // Resolve relative to the link's parent, then ensure it stays within dest.
    let candidate = normalize_lexical(&link_parent.join(link_name));
    let norm_dest = normalize_lexical(dest);
    if candidate.strip_prefix(&norm_dest).is_err() {
        return Err(format!(
            "archive contains unsafe link target (escapes dest): {} -> {}",
            link_parent.display(),
            link_name.display()
        )
        .into());
    }

    Ok(())
}

fn create_parent(dest: &Path, full_path: &Path) -> Result<()> {
    if let Some(parent) = full_path.parent() {
        if parent.starts_with(dest) {
            ensure_no_symlink_components(dest, parent)?;
        }
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
    }
    Ok(())
}

/// Extract a tar stream with security checks
fn extract_tar<R: Read>(reader: R, dest: &Path, strip: usize) -> Result<Vec<PathBuf>> {
    let mut archive = tar::Archive::new(reader);
    let mut files = Vec::new();

    for entry in archive
        .entries()
        .map_err(|e| format!("tar read error: {}", e))?
    {
        let mut entry = entry.map_err(|e| format!("tar entry error: {}", e))?;

        let path = entry
            .path()
            .map_err(|e| format!("tar path error: {}", e))?
            .into_owned();

        if !is_safe_path(&path) {
            return Err(format!("tar contains unsafe path: {}", path.display()).into());
        }

        let is_dir = entry.header().entry_type() == tar::EntryType::Directory;
        let Some(rel) = strip_path(&path, strip, is_dir) else {
            continue;
        };
        let full_path = dest.join(&rel);

        // Block tar "symlink swap" escapes: writing through an existing
        // symlink could leave `dest` even when `rel` is syntactically safe.
        ensure_no_symlink_components(dest, &full_path)?;

        match entry.header().entry_type() {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&full_path).map_err(|e| {
                    format!("cannot create directory {}: {}", full_path.display(), e)
                })?;
            }
            tar::EntryType::Symlink => {
                let link_name = entry
                    .link_name()
                    .map_err(|e| format!("tar link_name error: {}", e))?
                    .ok_or_else(|| format!("tar contains symlink without target: {}", path.display()))?
                    .into_owned();
                let link_parent = full_path.parent().unwrap_or(dest);
                ensure_link_target_within_dest(dest, link_parent, &link_name)?;

                create_parent(dest, &full_path)?;
                entry
                    .unpack(&full_path)
                    .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
            }
            tar::EntryType::Link => {
                // Hard link targets are archive paths, so they are stripped too
                let target = entry
                    .link_name()
                    .map_err(|e| format!("tar link_name error: {}", e))?
                    .ok_or_else(|| format!("tar contains hardlink without target: {}", path.display()))?
                    .into_owned();
                if !is_safe_path(&target) {
                    return Err(format!(
                        "tar contains unsafe link target: {} -> {}",
                        path.display(),
                        target.display()
                    )
                    .into());
                }
                let target = strip_path(&target, strip, false)
                    .map(|t| dest.join(t))
                    .ok_or_else(|| format!("hardlink target stripped away: {}", target.display()))?;
                ensure_no_symlink_components(dest, &target)?;

                create_parent(dest, &full_path)?;
                if full_path.exists() {
                    std::fs::remove_file(&full_path)
                        .map_err(|e| format!("cannot replace {}: {}", full_path.display(), e))?;
                }
                std::fs::hard_link(&target, &full_path).map_err(|e| {
                    format!(
                        "cannot link {} -> {}: {}",
                        full_path.display(),
                        target.display(),
                        e
                    )
                })?;
                files.push(rel);
            }
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::GNUSparse => {
                create_parent(dest, &full_path)?;
                entry
                    .unpack(&full_path)
                    .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
                files.push(rel);
            }
            // Device nodes, fifos and metadata-only entries
            _ => {}
        }
    }

    Ok(files)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    if link.exists() {
        std::fs::remove_file(link)
            .map_err(|e| format!("cannot replace {}: {}", link.display(), e))?;
    }
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        format!(
            "cannot link {} -> {}: {}",
            link.display(),
            target.display(),
            e
        )
        .into()
    })
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, _link: &Path) -> Result<()> {
    Ok(())
}

/// Extract a zip archive
fn extract_zip<R: Read + std::io::Seek>(reader: R, dest: &Path, strip: usize) -> Result<Vec<PathBuf>> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| format!("zip read error: {}", e))?;
    let mut files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("zip entry error: {}", e))?;

        let path = file
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .filter(|p| is_safe_path(p))
            .ok_or_else(|| format!("zip contains unsafe path: {}", file.name()))?;
        let is_dir = file.is_dir();
        let Some(rel) = strip_path(&path, strip, is_dir) else {
            continue;
        };
        let outpath = dest.join(&rel);
        ensure_no_symlink_components(dest, &outpath)?;

        if is_dir {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| format!("cannot create directory {}: {}", outpath.display(), e))?;
            continue;
        }

        // Symlinks store their target as the entry body
        if file.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            file.read_to_string(&mut target)
                .map_err(|e| format!("zip link target error for {}: {}", path.display(), e))?;
            let link_parent = outpath.parent().unwrap_or(dest);
            ensure_link_target_within_dest(dest, link_parent, Path::new(&target))?;

            create_parent(dest, &outpath)?;
            create_symlink(Path::new(&target), &outpath)?;
            continue;
        }

        create_parent(dest, &outpath)?;
        let mut outfile = File::create(&outpath)
            .map_err(|e| format!("cannot create {}: {}", outpath.display(), e))?;
        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| format!("write error for {}: {}", outpath.display(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|e| format!("cannot set mode on {}: {}", outpath.display(), e))?;
            }
        }

        files.push(rel);
    }

    Ok(files)
}
