//! `emlimport` - import `.eml` files into an IMAP mailbox
//!
//! Every file is appended to the target mailbox and then moved into an
//! archive directory, so a run that stops halfway can simply be started
//! again. Files larger than the server's APPENDLIMIT (or, when the server
//! states none, `--remote-limit`) are skipped and left in place.
//!
//! # Environment Variables
//!
//! - `EMLIMPORT_HOST`, `EMLIMPORT_PORT`: server address
//! - `EMLIMPORT_USERNAME`, `EMLIMPORT_PASSWORD`: login
//! - `RUST_LOG`: log filter, overrides `--verbose`

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use emlimport_core::config::{
    DEFAULT_ARCHIVE_DIR, DEFAULT_MAILBOX, DEFAULT_PORT, DEFAULT_SIZE_LIMIT,
};
use emlimport_core::{ImapConnector, ImportConfig, Importer};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "emlimport=info,emlimport_core=info,emlimport_imap=warn";
const VERBOSE_FILTER: &str = "emlimport=debug,emlimport_core=debug,emlimport_imap=debug";

/// Import .eml files into an IMAP mailbox
#[derive(Parser, Debug)]
#[command(name = "emlimport")]
#[command(version, about, long_about = None)]
struct Args {
    /// IMAP server host
    #[arg(long, env = "EMLIMPORT_HOST")]
    host: String,

    /// IMAP server port (implicit TLS)
    #[arg(long, env = "EMLIMPORT_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Login name
    #[arg(long, env = "EMLIMPORT_USERNAME")]
    username: String,

    /// Login password
    #[arg(long, env = "EMLIMPORT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Mailbox to import into
    #[arg(long, value_name = "MAILBOX", default_value = DEFAULT_MAILBOX)]
    remote_dir: String,

    /// Size limit used when the server does not advertise one (e.g. 20M, 50MiB, 0 for none)
    #[arg(long, value_name = "SIZE", default_value = DEFAULT_SIZE_LIMIT)]
    remote_limit: String,

    /// Directory imported files are moved into
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ARCHIVE_DIR)]
    archive_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Files to import (defaults to *.eml in the current directory)
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Lists the regular `*.eml` files in `dir`, sorted by name.
async fn discover_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot list {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "eml") {
            continue;
        }
        // Follows symlinks, like a shell glob would.
        if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ImportConfig::builder(args.host, args.username, args.password)
        .port(args.port)
        .mailbox(args.remote_dir)
        .size_limit(args.remote_limit)
        .archive_dir(args.archive_dir)
        .build()?;

    let candidates = if args.files.is_empty() {
        discover_candidates(Path::new(".")).await?
    } else {
        args.files
    };
    info!(files = candidates.len(), mailbox = %config.mailbox, "starting import");

    let mut importer = Importer::new(&config, ImapConnector);
    match importer.run_with_report(&candidates).await {
        Ok(report) => {
            info!(
                imported = report.imported(),
                skipped = report.skipped(),
                "import finished"
            );
            Ok(())
        }
        Err(failure) => {
            if failure.report.processed() > 0 {
                warn!(
                    imported = failure.report.imported(),
                    skipped = failure.report.skipped(),
                    "import stopped early"
                );
            }
            Err(failure.error.into())
        }
    }
}
