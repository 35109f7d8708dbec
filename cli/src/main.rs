//! filemover - Command-line interface for the file mover engine.
//!
//! Copies or moves every file of a source tree into a destination, with
//! exclusion patterns, optional flattening and duplicate renaming. Settings
//! of every successful run are saved next to the source and can be reused
//! with `--config`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use engine::{
    clean_empty_dirs, join_patterns, list_snapshots, load_snapshot, parse_patterns, preview,
    run_transfer, save_snapshot, OutcomeKind, ProgressCallback, RunOptions, SnapshotId,
    TransferMethod, TransferOutcome, TransferSettings, TransferSummary,
};

const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:60.cyan/blue} {pos}/{len} {msg}";
const PROGRESS_BAR_CHARS: &str = "=>-";

/// filemover - Bulk copy or move files between directories
#[derive(Parser, Debug)]
#[command(name = "filemover")]
#[command(version)]
#[command(about = "Copy or move directory trees with exclusion patterns")]
struct Cli {
    /// Debug logging and one line per file
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy or move files from source to destination
    Transfer {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Show what would happen without touching any file
        #[arg(long)]
        dry_run: bool,
    },

    /// List what a transfer would do
    Preview {
        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Remove empty directories below a source directory
    Clean {
        /// Directory to sweep
        #[arg(long, value_name = "PATH")]
        src: PathBuf,
    },

    /// Save the given settings as a snapshot without running
    Save {
        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// List saved snapshots for a source directory, newest first
    Configs {
        /// Source directory the snapshots were saved under
        #[arg(long, value_name = "PATH")]
        src: PathBuf,
    },
}

/// Transfer settings; explicit flags override values loaded with `--config`
#[derive(Args, Debug, Default, Clone)]
struct SettingsArgs {
    /// Source directory
    #[arg(long, value_name = "PATH")]
    src: Option<PathBuf>,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    dst: Option<PathBuf>,

    /// Comma-separated glob patterns matched against file names, e.g. "*.tmp, .DS_Store"
    #[arg(long, value_name = "PATTERNS")]
    exclude: Option<String>,

    /// Operation mode
    #[arg(long, value_enum, value_name = "MODE")]
    mode: Option<ModeArg>,

    /// Put every file directly in the destination instead of keeping subdirectories
    #[arg(long, overrides_with = "no_flatten")]
    flatten: bool,

    /// Keep the source's subdirectories, even if the snapshot flattens
    #[arg(long, overrides_with = "flatten")]
    no_flatten: bool,

    /// Write name_1.ext, name_2.ext, ... instead of overwriting existing files
    #[arg(long, overrides_with = "no_rename_duplicates")]
    rename_duplicates: bool,

    /// Overwrite existing files, even if the snapshot renames them
    #[arg(long, overrides_with = "rename_duplicates")]
    no_rename_duplicates: bool,

    /// Start from a saved snapshot
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ModeArg {
    Copy,
    Move,
}

impl From<ModeArg> for TransferMethod {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Copy => TransferMethod::Copy,
            ModeArg::Move => TransferMethod::Move,
        }
    }
}

impl SettingsArgs {
    /// Build engine settings: snapshot first (if any), then flags on top.
    fn resolve(&self) -> Result<TransferSettings> {
        let mut settings = match &self.config {
            Some(path) => load_snapshot(&SnapshotId::from_path(path))
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => TransferSettings::default(),
        };

        if let Some(src) = &self.src {
            settings.source_root = src.clone();
        }
        if let Some(dst) = &self.dst {
            settings.dest_root = dst.clone();
        }
        if let Some(exclude) = &self.exclude {
            settings.exclude_patterns = parse_patterns(exclude);
        }
        if let Some(mode) = self.mode {
            settings.transfer_method = mode.into();
        }
        if self.flatten {
            settings.preserve_structure = false;
        } else if self.no_flatten {
            settings.preserve_structure = true;
        }
        if self.rename_duplicates {
            settings.rename_duplicates = true;
        } else if self.no_rename_duplicates {
            settings.rename_duplicates = false;
        }

        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

/// CLI implementation of ProgressCallback drawing an indicatif bar
struct CliProgress {
    bar: ProgressBar,
    method: TransferMethod,
    verbose: bool,
    start_time: Instant,
}

impl CliProgress {
    fn new(method: TransferMethod, verbose: bool, quiet: bool) -> Self {
        let bar = if quiet || cfg!(test) {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(PROGRESS_BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars(PROGRESS_BAR_CHARS),
            );
            bar
        };
        CliProgress {
            bar,
            method,
            verbose,
            start_time: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn format_duration(elapsed: Duration) -> String {
        let secs = elapsed.as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }
}

impl ProgressCallback for CliProgress {
    fn on_run_started(&self, settings: &TransferSettings, total: usize) {
        self.bar.set_length(total as u64);
        if self.verbose {
            self.bar.suspend(|| {
                println!("Source:      {}", settings.source_root.display());
                println!("Destination: {}", settings.dest_root.display());
                println!("Mode:        {}", settings.transfer_method);
                println!("Files:       {}", total);
                println!();
            });
        }
    }

    fn on_file_processed(&self, _index: usize, _total: usize, outcome: &TransferOutcome) {
        if self.verbose {
            let line = match (&outcome.kind, &outcome.dest_relative) {
                (OutcomeKind::Transferred, Some(dest)) => format!(
                    "{}: {} -> {}",
                    self.method.past_tense(),
                    outcome.source_relative.display(),
                    dest.display()
                ),
                _ => format!("Skipped: {}", outcome.source_relative.display()),
            };
            self.bar.suspend(|| println!("{}", line));
        }
        self.bar.set_message(outcome.source_relative.display().to_string());
        self.bar.inc(1);
    }

    fn on_run_completed(&self, _summary: &TransferSummary) {
        self.bar.finish_and_clear();
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse arguments, run the command, map failure to exit code 2
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let exit_code = match run_cli(&cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Transfer { settings, dry_run } => {
            let settings = settings.resolve()?;
            if *dry_run {
                let summary = preview(&settings).context("Preview failed")?;
                print_plan(&summary);
            } else {
                let progress =
                    CliProgress::new(settings.transfer_method, cli.verbose, cli.quiet);
                let summary = run_transfer(&settings, RunOptions::default(), Some(&progress))
                    .context("Transfer failed")?;
                if !cli.quiet {
                    for line in summary_lines(&summary, progress.elapsed()) {
                        println!("{}", line);
                    }
                    print_enumeration_errors(&summary);
                }
            }
        }
        Command::Preview { settings } => {
            let settings = settings.resolve()?;
            let summary = preview(&settings).context("Preview failed")?;
            print_plan(&summary);
        }
        Command::Clean { src } => {
            if !src.is_dir() {
                anyhow::bail!("Source directory does not exist: {}", src.display());
            }
            let report = clean_empty_dirs(src);
            if !cli.quiet {
                println!("Deleted {} empty directories", report.removed);
            }
            if !report.failures.is_empty() {
                anyhow::bail!(
                    "{} directories could not be removed",
                    report.failures.len()
                );
            }
        }
        Command::Save { settings } => {
            let settings = settings.resolve()?;
            let id = save_snapshot(&settings, &settings.source_root)
                .context("Failed to save settings")?;
            if !cli.quiet {
                println!("Configuration saved: {}", id);
            }
        }
        Command::Configs { src } => {
            let snapshots = list_snapshots(src)
                .with_context(|| format!("Failed to list configurations in {}", src.display()))?;
            if snapshots.is_empty() {
                println!("No configurations found");
            }
            for info in &snapshots {
                let saved: DateTime<Local> = info.modified.into();
                println!(
                    "{}  {}  {} -> {}  [{}]",
                    saved.format("%Y-%m-%d %H:%M"),
                    info.id.name(),
                    info.settings.source_root.display(),
                    info.settings.dest_root.display(),
                    join_patterns(&info.settings.exclude_patterns),
                );
            }
        }
    }

    Ok(())
}

/// One line per file, as a dry run planned it
fn print_plan(summary: &TransferSummary) {
    let verb = summary.method.as_str();
    for outcome in &summary.outcomes {
        match (&outcome.kind, &outcome.dest_relative) {
            (OutcomeKind::Transferred, Some(dest)) => println!(
                "Will {}: {} -> {}",
                verb,
                outcome.source_relative.display(),
                dest.display()
            ),
            _ => println!("Will skip: {} (excluded)", outcome.source_relative.display()),
        }
    }
    print_enumeration_errors(summary);
}

/// Closing report of a real run
fn summary_lines(summary: &TransferSummary, elapsed: Duration) -> Vec<String> {
    let mut lines = vec![
        "Operation complete!".to_string(),
        format!("{}: {} files", summary.method.past_tense(), summary.transferred),
        format!("Skipped: {} files", summary.skipped),
    ];
    if let Some(cleanup) = &summary.cleanup {
        lines.push(format!("Deleted {} empty directories", cleanup.removed));
    }
    if let Some(snapshot) = &summary.snapshot {
        lines.push(format!("Configuration saved: {}", snapshot));
    }
    lines.push(format!("Elapsed: {}", CliProgress::format_duration(elapsed)));
    lines
}

fn print_enumeration_errors(summary: &TransferSummary) {
    if summary.enumeration_errors.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("Not scanned:");
    for err in &summary.enumeration_errors {
        eprintln!("  {}", err.display_chain());
    }
}
