//! mdstamp CLI: keeps `created`, `modified` and `hash` frontmatter fields
//! of markdown documents current.
//!
//! Commands: watch, scan, stamp, check, completions

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use tracing::Level;

use mdstamp_core::Config;
use mdstamp_vault::{
    scan_vault, DocumentStore, FsStore, Handler, LogNotifier, Outcome, Report, Service, Summary,
};

#[derive(Parser)]
#[command(name = "mdstamp")]
#[command(version)]
#[command(about = "Keep created/modified timestamps and a content hash in markdown frontmatter")]
struct Cli {
    /// Configuration file [default: <VAULT>/.mdstamp.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every document, including ignored ones
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a vault and stamp documents as they are created or modified
    Watch {
        vault: PathBuf,
        /// Stamp every eligible document once before watching
        #[arg(long)]
        initial_scan: bool,
    },
    /// Stamp every eligible document in a vault once
    Scan {
        vault: PathBuf,
        /// Print a JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Stamp specific documents
    Stamp {
        vault: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print a JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Report which documents would be stamped, without writing
    Check {
        vault: PathBuf,
        /// Print a JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Serialize)]
struct BatchReport {
    summary: Summary,
    documents: Vec<Report>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Watch {
            vault,
            initial_scan,
        } => {
            let handler = open_handler(&vault, cli.config.as_deref(), false)?;
            watch(handler, initial_scan).await
        }
        Commands::Scan { vault, json } => {
            let handler = open_handler(&vault, cli.config.as_deref(), false)?;
            let paths = scan_vault(handler.store().root(), handler.filter())?;
            finish(&run_batch(&handler, &paths), json, "stamped")
        }
        Commands::Stamp { vault, files, json } => {
            let handler = open_handler(&vault, cli.config.as_deref(), false)?;
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            let paths: Vec<PathBuf> = files
                .iter()
                .map(|file| resolve_document(handler.store(), &cwd, file))
                .collect();
            finish(&run_batch(&handler, &paths), json, "stamped")
        }
        Commands::Check { vault, json } => {
            let handler = open_handler(&vault, cli.config.as_deref(), true)?;
            let paths = scan_vault(handler.store().root(), handler.filter())?;
            finish(&run_batch(&handler, &paths), json, "would stamp")
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "mdstamp", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_handler(
    vault: &Path,
    config_path: Option<&Path>,
    dry_run: bool,
) -> Result<Handler<FsStore, LogNotifier>> {
    let store =
        FsStore::open(vault).with_context(|| format!("cannot open vault {}", vault.display()))?;
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::load_for_vault(store.root())?,
    };
    Ok(Handler::new(store, LogNotifier, &config).with_dry_run(dry_run))
}

/// Paths given on the command line are taken relative to the working
/// directory when that names an existing file inside the vault, and relative
/// to the vault root otherwise.
fn resolve_document(store: &FsStore, cwd: &Path, file: &Path) -> PathBuf {
    let from_cwd = cwd.join(file);
    if from_cwd.is_file() && store.relative_path(&from_cwd).is_some() {
        from_cwd
    } else {
        file.to_path_buf()
    }
}

fn run_batch(handler: &Handler<FsStore, LogNotifier>, paths: &[PathBuf]) -> BatchReport {
    let mut summary = Summary::default();
    let documents = paths
        .iter()
        .map(|path| {
            let outcome = handler.handle_path(path);
            summary.record(&outcome);
            let path = handler
                .store()
                .relative_path(path)
                .unwrap_or_else(|| path.clone());
            Report { path, outcome }
        })
        .collect();
    BatchReport { summary, documents }
}

fn finish(report: &BatchReport, json: bool, verb: &str) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for doc in &report.documents {
            match &doc.outcome {
                Outcome::Ok => println!("{verb}: {}", doc.path.display()),
                Outcome::Error { message } => println!("error: {message}"),
                Outcome::Ignored { .. } => {}
            }
        }
        let summary = report.summary;
        println!(
            "{} {verb}, {} ignored, {} errors",
            summary.written, summary.ignored, summary.errors
        );
    }

    Ok(exit_code(&report.summary))
}

fn exit_code(summary: &Summary) -> ExitCode {
    if summary.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn watch(handler: Handler<FsStore, LogNotifier>, initial_scan: bool) -> Result<ExitCode> {
    let service = Service::start(handler)?;
    if initial_scan {
        service.initial_scan()?;
    }

    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = Arc::clone(&stop);
    let worker = tokio::task::spawn_blocking(move || {
        let summary = service.run(&worker_stop);
        service.shutdown();
        summary
    });

    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for Ctrl-C")?;
    tracing::info!("shutting down");
    stop.store(true, Ordering::SeqCst);

    let summary = worker.await.context("watch loop panicked")?;
    println!(
        "{} stamped, {} ignored, {} errors",
        summary.written, summary.ignored, summary.errors
    );
    Ok(exit_code(&summary))
}
