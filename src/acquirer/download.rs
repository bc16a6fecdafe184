//! Download phase - fetches every source matching the platform into the
//! destination and makes the results executable.

use futures_util::future::try_join_all;
use std::path::PathBuf;

use crate::capability::{FetchOptions, Fetched, Fetcher, Filesystem};
use crate::core::output;
use crate::error::AcquireError;
use crate::platform::Platform;
use crate::spec::AcquisitionSpec;
use crate::util::url_filename;

/// Mode given to every downloaded file.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Fetch all sources matching `platform` concurrently.
///
/// Returns the full paths of the downloaded files, in source order and, for
/// archives, in archive order.
pub async fn download(
    spec: &AcquisitionSpec,
    platform: &Platform,
    fetcher: &dyn Fetcher,
    fs: &dyn Filesystem,
    verbose: bool,
) -> Result<Vec<PathBuf>, AcquireError> {
    let sources = platform.filter(spec.sources());
    if sources.is_empty() {
        return Err(AcquireError::NoMatchingSource {
            platform: platform.clone(),
        });
    }

    let dest = spec.destination();
    let options = FetchOptions {
        extract: true,
        strip_components: spec.options().strip_components,
    };

    if verbose {
        for source in &sources {
            output::detail(&format!("fetching {}", source.url));
        }
    }

    let fetched = try_join_all(
        sources
            .iter()
            .map(|source| fetcher.fetch(&source.url, dest, &options)),
    )
    .await?;

    let files: Vec<PathBuf> = sources
        .iter()
        .zip(fetched)
        .flat_map(|(source, fetched)| match fetched {
            Fetched::Archive(manifest) => manifest,
            Fetched::RawFile => vec![PathBuf::from(url_filename(&source.url))],
        })
        .map(|name| dest.join(name))
        .collect();

    try_join_all(files.iter().map(|path| async move {
        fs.set_mode(path, EXECUTABLE_MODE)
            .await
            .map_err(|source| AcquireError::Permission {
                path: path.clone(),
                source,
            })
    }))
    .await?;

    if verbose {
        for file in &files {
            output::detail(&format!("installed {}", file.display()));
        }
    }

    Ok(files)
}
