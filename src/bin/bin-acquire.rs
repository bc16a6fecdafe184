//! bin-acquire CLI - fetch and check the binary described by a manifest
//!
//! Usage:
//!   bin-acquire run [-- args...]     Acquire the binary and verify it
//!   bin-acquire path                 Print where the binary resolves to
//!   bin-acquire sources [--json]     List sources and which apply here
//!   bin-acquire status               Show what is on disk

use anyhow::{Context, Result};
use bin_acquire::capability::{FileStat, Filesystem, HttpFetcher, TokioFilesystem};
use bin_acquire::core::output;
use bin_acquire::manifest::{DEFAULT_MANIFEST, MANIFEST_ENV};
use bin_acquire::{BinaryAcquirer, Manifest, Platform};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bin-acquire")]
#[command(about = "Download, unpack and verify platform-specific binaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the manifest file
    #[arg(short, long, global = true, env = MANIFEST_ENV, default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire the binary if missing, then verify it
    Run {
        /// Do not run the binary after acquiring it
        #[arg(long)]
        skip_check: bool,

        /// Arguments passed to the binary when verifying it
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the resolved path of the binary
    Path,

    /// List configured sources
    Sources {
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Show whether the binary is present and what the destination holds
    Status,
}

#[derive(Serialize)]
struct SourceRow<'a> {
    url: &'a str,
    os: Option<&'a str>,
    arch: Option<&'a str>,
    matches: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let manifest = Manifest::load(&cli.manifest)?;

    match cli.command {
        Commands::Run { skip_check, args } => run(&manifest, skip_check, args),
        Commands::Path => {
            let acquirer = BinaryAcquirer::new(manifest.to_spec()?);
            println!("{}", acquirer.resolved_path().display());
            Ok(())
        }
        Commands::Sources { json } => sources(&manifest, json),
        Commands::Status => status(&manifest),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

fn run(manifest: &Manifest, skip_check: bool, args: Vec<String>) -> Result<()> {
    let mut spec = manifest.to_spec()?;
    if skip_check {
        spec = spec.to_builder().skip_check(true).build()?;
    }
    let args = if args.is_empty() {
        manifest.test_args()
    } else {
        args
    };

    let acquirer = BinaryAcquirer::new(spec)
        .with_fetcher(HttpFetcher::new().with_progress(true))
        .verbose(true);

    output::action(&format!("Acquiring {}", manifest.binary));
    let report = runtime()?
        .block_on(acquirer.run(&args))
        .with_context(|| format!("Failed to acquire {}", manifest.binary))?;

    if report.was_downloaded() {
        output::info(&format!("downloaded {} file(s)", report.downloaded.len()));
    }
    output::success(&format!(
        "{} ready at {}",
        manifest.binary,
        report.resolved_path.display()
    ));
    Ok(())
}

fn sources(manifest: &Manifest, json: bool) -> Result<()> {
    let platform = Platform::current();
    let rows: Vec<SourceRow> = manifest
        .sources
        .iter()
        .map(|source| SourceRow {
            url: &source.url,
            os: source.os.as_deref(),
            arch: source.arch.as_deref(),
            matches: platform.matches(source),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::skip("no sources configured");
        return Ok(());
    }

    let matching = rows.iter().filter(|row| row.matches).count();
    output::info(&format!(
        "{} source(s), {} matching {}",
        rows.len(),
        matching,
        platform
    ));
    for row in &rows {
        let filter = format!(
            "[{}/{}]",
            row.os.unwrap_or("any"),
            row.arch.unwrap_or("any")
        );
        output::list_item(row.url, &filter, row.matches);
    }
    Ok(())
}

fn status(manifest: &Manifest) -> Result<()> {
    let spec = manifest.to_spec()?;
    let acquirer = BinaryAcquirer::new(spec);
    let path = acquirer.resolved_path();
    let destination = acquirer.spec().destination().to_path_buf();
    let fs = TokioFilesystem;

    runtime()?.block_on(async {
        match fs.stat(&path).await {
            Ok(stat) => output::success(&format!("{} present ({})", path.display(), describe(&stat))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                output::skip(&format!("{} not present", path.display()))
            }
            Err(e) => output::error(&format!("cannot stat {}: {}", path.display(), e)),
        }

        match fs.read_dir(&destination).await {
            Ok(entries) if entries.is_empty() => {
                output::detail(&format!("{} is empty", destination.display()));
            }
            Ok(entries) => {
                output::info(&format!("contents of {}", destination.display()));
                for entry in &entries {
                    let kind = match fs.stat(entry).await {
                        Ok(stat) => describe(&stat),
                        Err(e) => e.to_string(),
                    };
                    output::list_item(&file_name(entry), &kind, entry == &path);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                output::detail(&format!("{} does not exist yet", destination.display()));
            }
            Err(e) => output::error(&format!("cannot list {}: {}", destination.display(), e)),
        }
    });

    Ok(())
}

fn describe(stat: &FileStat) -> String {
    if stat.is_dir {
        "directory".to_string()
    } else if stat.is_executable_by_all() {
        format!("{} bytes, executable", stat.len)
    } else {
        format!("{} bytes", stat.len)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_collects_trailing_args() {
        let cli = Cli::try_parse_from(["bin-acquire", "run", "--skip-check", "--", "-V", "--quiet"])
            .unwrap();
        match cli.command {
            Commands::Run { skip_check, args } => {
                assert!(skip_check);
                assert_eq!(args, ["-V", "--quiet"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_manifest_flag_is_global() {
        let cli = Cli::try_parse_from(["bin-acquire", "sources", "--json", "-m", "tools/gifsicle.toml"])
            .unwrap();
        assert_eq!(cli.manifest, PathBuf::from("tools/gifsicle.toml"));
        assert!(matches!(cli.command, Commands::Sources { json: true }));
    }
}
