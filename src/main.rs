use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use fotolist::catalog::{CatalogRepository, FileStatus};
use fotolist::config::Config;
use fotolist::fs::{LocalStore, PhotoStore};
use fotolist::logging;
use fotolist::photo::{
    sanitize_request_path, BaselineSource, ManifestHandler, PhotoError, PhotoManager,
};

#[derive(Parser)]
#[command(name = "fotolist", version, about = "Compare photo folders against a recorded file list")]
struct Cli {
    /// Configuration file (defaults to $FOTOLIST_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record every file name under a folder
    CreateList {
        folder: String,
        /// Manifest destination (defaults to the report directory)
        #[arg(short, long, conflicts_with = "stdout")]
        output: Option<String>,
        /// Write the list to stdout instead of a file
        #[arg(long)]
        stdout: bool,
    },
    /// Report names missing on disk and names missing from the baseline
    Diff {
        folder: String,
        #[arg(short, long, required_unless_present = "catalog", conflicts_with = "catalog")]
        manifest: Option<String>,
        /// Use the photo catalog as the baseline
        #[arg(long)]
        catalog: bool,
        /// Only report unlisted files with an image extension
        #[arg(long)]
        images_only: bool,
        /// Base name for the two report files
        #[arg(long)]
        report_name: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move files the baseline no longer lists into quarantine folders
    Clean {
        folder: String,
        #[arg(short, long, required_unless_present = "catalog", conflicts_with = "catalog")]
        manifest: Option<String>,
        /// Use the photo catalog as the baseline
        #[arg(long)]
        catalog: bool,
        /// Write the removed names to stdout instead of a file
        #[arg(long)]
        stdout: bool,
    },
    /// Show catalog rows
    Catalog {
        #[arg(long, value_enum)]
        status: Option<FileStatus>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            // Rejected requests are distinguished from operational failures
            let rejected = err
                .downcast_ref::<PhotoError>()
                .is_some_and(|e| e.kind().is_rejection());
            if rejected {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Command::Diff { images_only: true, .. } = cli.command {
        config.image_extensions_only = true;
    }

    let store: Arc<dyn PhotoStore> = Arc::new(LocalStore::new());
    let catalog = match config.catalog_path {
        Some(ref path) => Some(Arc::new(CatalogRepository::open(Arc::clone(&store), path).await?)),
        None => None,
    };

    let spinner = spinner();
    let progress = spinner.clone();
    let mut manager = PhotoManager::new(Arc::clone(&store), config)?.with_progress_callback(move |p| {
        progress.set_message(format!("{} folders, {} files", p.directories_visited, p.files_found));
    });
    if let Some(ref catalog) = catalog {
        manager = manager.with_catalog(Arc::clone(catalog));
    }

    let result = match cli.command {
        Command::CreateList { folder, output, stdout } => {
            let folder = folder_arg(&folder)?;
            if stdout {
                let names = manager.create_list(&folder).await?;
                spinner.finish_and_clear();
                ManifestHandler::write_lines(&mut tokio::io::stdout(), &names).await?;
            } else {
                let dest = output.as_deref().map(sanitize_output).transpose()?;
                let path = manager.create_list_file(&folder, dest.as_deref()).await?;
                spinner.finish_and_clear();
                println!("{} {}", "List written to".green(), path.display());
            }
            Ok(())
        }
        Command::Diff {
            folder,
            manifest,
            catalog: use_catalog,
            images_only: _,
            report_name,
            json,
        } => {
            let folder = folder_arg(&folder)?;
            let baseline = baseline_arg(&manager, manifest.as_deref(), use_catalog)?;
            let report = manager.diff(baseline.as_ref(), &folder).await?;
            let files = manager.write_diff_reports(&report, report_name.as_deref()).await?;
            spinner.finish_and_clear();

            if json {
                println!("{}", report.to_json().context("serializing diff report")?);
            } else {
                print!("{}", report.to_plain_text());
                println!("{} {}", "Baseline report:".green(), files.baseline.display());
                println!("{} {}", "Target report:  ".green(), files.target.display());
            }
            Ok(())
        }
        Command::Clean {
            folder,
            manifest,
            catalog: use_catalog,
            stdout,
        } => {
            let folder = folder_arg(&folder)?;
            let baseline = baseline_arg(&manager, manifest.as_deref(), use_catalog)?;
            let report = manager.clean(baseline.as_ref(), &folder).await?;
            spinner.finish_and_clear();

            if stdout {
                ManifestHandler::write_lines(&mut tokio::io::stdout(), report.removed_names()).await?;
            } else {
                let path = manager.write_removed_report(&report).await?;
                println!(
                    "{} {} file(s) quarantined, {} kept",
                    "Clean complete:".green(),
                    report.removed_count(),
                    report.files_kept
                );
                println!("{} {}", "Removed report:".green(), path.display());
            }
            Ok(())
        }
        Command::Catalog { status } => {
            spinner.finish_and_clear();
            let Some(catalog) = manager.catalog() else {
                bail!("no catalog_path configured");
            };
            let rows = match status {
                Some(status) => catalog.get_by_status(status).await,
                None => catalog.get_all().await,
            };
            for row in &rows {
                println!(
                    "{:>6}  {:<8} {:<12} {}  {}",
                    row.id,
                    row.file_status.to_string(),
                    row.device_name,
                    row.full_name(),
                    row.album_name.dimmed()
                );
            }
            println!("{} row(s)", rows.len());
            Ok(())
        }
    };

    spinner.finish_and_clear();
    result
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} Scanning: {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn folder_arg(raw: &str) -> Result<PathBuf, PhotoError> {
    sanitize_request_path(raw).map_err(|rejection| PhotoError::invalid_folder(raw, rejection.to_string()))
}

fn sanitize_output(raw: &str) -> Result<PathBuf, PhotoError> {
    sanitize_request_path(raw).map_err(|rejection| PhotoError::WriteFailure {
        path: PathBuf::from(raw),
        source: io::Error::new(io::ErrorKind::InvalidInput, rejection),
    })
}

fn baseline_arg(
    manager: &PhotoManager,
    manifest: Option<&str>,
    use_catalog: bool,
) -> Result<Box<dyn BaselineSource>> {
    if use_catalog {
        let Some(catalog) = manager.catalog() else {
            bail!("--catalog requires catalog_path in the configuration");
        };
        return Ok(Box::new(Arc::clone(catalog)));
    }

    let raw = manifest.context("a manifest path is required")?;
    Ok(Box::new(manager.request_baseline(raw)))
}
