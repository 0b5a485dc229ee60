use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use strata_analysis::{analyze_timeline, CancelFlag, TimelineAnalysis};
use strata_diff::{diff_snapshots, DiffConfig, SnapshotHandle};
use strata_discovery::{discover_snapshots, list_projects, SnapshotInfo};
use strata_progress::{compute_snapshots_hash, ProgressTracker};

mod config;
mod report;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Reconstruct a codebase's evolution from zip snapshots", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a strata.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects with two or more snapshots in the snapshot directory
    Projects {
        /// Directory containing snapshot zip archives
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List the ordered snapshots discovered for a project
    Snapshots(ProjectArgs),

    /// Diff one pair of snapshot archives
    Diff(DiffArgs),

    /// Compute the analysis plan for a project's timeline
    Plan(PlanArgs),

    /// Show narration progress for a project
    Status(ProjectArgs),

    /// Discard persisted narration progress for a project
    Reset(ProjectArgs),

    /// Render a markdown evolution report from the plan and stored results
    Report(ReportArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// Project name, matched case-insensitively against zip filenames
    project: String,

    /// Directory containing snapshot zip archives
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Directory holding persisted progress state
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

#[derive(Args)]
struct DiffArgs {
    /// Older snapshot archive
    old: PathBuf,

    /// Newer snapshot archive
    new: PathBuf,

    /// Cap on emitted diff lines per file (0 = unlimited)
    #[arg(long)]
    max_diff_lines: Option<usize>,
}

#[derive(Args)]
struct PlanArgs {
    /// Project name, matched case-insensitively against zip filenames
    project: String,

    /// Directory containing snapshot zip archives
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Directory holding persisted progress state
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Print the full JSON contract instead of the human summary
    #[arg(long)]
    json: bool,

    /// Write the JSON contract to a file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Only analyze the first N transitions
    #[arg(long)]
    max_pairs: Option<usize>,
}

#[derive(Args)]
struct ReportArgs {
    /// Project name, matched case-insensitively against zip filenames
    project: String,

    /// Directory containing snapshot zip archives
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Directory holding persisted progress state
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let app_config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Projects { dir } => run_projects(&app_config, dir),
        Commands::Snapshots(args) => run_snapshots(&app_config, args),
        Commands::Diff(args) => run_diff(&app_config, args),
        Commands::Plan(args) => run_plan(&app_config, args).await,
        Commands::Status(args) => run_status(&app_config, args),
        Commands::Reset(args) => run_reset(&app_config, args),
        Commands::Report(args) => run_report(&app_config, args).await,
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run_projects(config: &AppConfig, dir: Option<PathBuf>) -> Result<()> {
    let dir = config.resolve_snapshot_dir(dir)?;
    let projects = list_projects(&dir)?;
    if projects.is_empty() {
        println!("No projects with 2+ snapshots found in {}.", dir.display());
        return Ok(());
    }

    println!("Found {} project(s) with 2+ snapshots:", projects.len());
    for (name, count) in &projects {
        println!("  {name:<30} {count} snapshots");
    }
    Ok(())
}

fn run_snapshots(config: &AppConfig, args: ProjectArgs) -> Result<()> {
    let dir = config.resolve_snapshot_dir(args.dir)?;
    let snapshots = discover_snapshots(&dir, &args.project)?;

    println!("Found {} snapshots for '{}':", snapshots.len(), args.project);
    for snapshot in &snapshots {
        println!("  {:<20} {}", snapshot.label, snapshot.filename);
    }
    Ok(())
}

fn run_diff(config: &AppConfig, args: DiffArgs) -> Result<()> {
    let mut diff_config = config.diff_config();
    if let Some(cap) = args.max_diff_lines {
        diff_config.max_diff_lines = cap;
    }

    let old = handle_for_archive(&args.old);
    let new = handle_for_archive(&args.new);
    let diff = diff_snapshots(&old, &new, &diff_config)?;

    println!("Added:     {} files", diff.added.len());
    println!("Removed:   {} files", diff.removed.len());
    println!("Modified:  {} files", diff.modified.len());
    println!("Moved:     {} files", diff.moved.len());
    println!("Unchanged: {} files", diff.unchanged.len());
    println!("Total diff lines: {}", diff.total_diff_lines);
    println!("Total lines in new snapshot: {}", diff.total_lines_in_new);
    if !diff.status_docs.is_empty() {
        let names: Vec<&str> = diff.status_docs.keys().map(String::as_str).collect();
        println!("Status docs found: {}", names.join(", "));
    }

    print_paths("Added files", &diff.added);
    print_paths("Removed files", &diff.removed);
    if !diff.moved.is_empty() {
        println!("\nMoved files:");
        for pair in diff.moved.iter().take(10) {
            println!("  {} -> {}", pair.from, pair.to);
        }
    }
    if !diff.modified.is_empty() {
        println!("\nModified files:");
        for file_diff in diff.modified.iter().take(5) {
            println!(
                "  ~ {} ({} diff lines)",
                file_diff.path, file_diff.diff_line_count
            );
        }
    }
    Ok(())
}

fn print_paths(title: &str, paths: &[String]) {
    if paths.is_empty() {
        return;
    }
    println!("\n{title}:");
    for path in paths.iter().take(10) {
        println!("  {path}");
    }
    if paths.len() > 10 {
        println!("  ... ({} more)", paths.len() - 10);
    }
}

fn handle_for_archive(path: &Path) -> SnapshotHandle {
    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    SnapshotHandle::new(label, path)
}

async fn run_plan(config: &AppConfig, args: PlanArgs) -> Result<()> {
    let dir = config.resolve_snapshot_dir(args.dir)?;
    let snapshots = discover_snapshots(&dir, &args.project)?;

    let mut handles: Vec<SnapshotHandle> = snapshots
        .iter()
        .map(|s| SnapshotHandle::new(&s.label, &s.path))
        .collect();
    if let Some(max_pairs) = args.max_pairs {
        handles.truncate(max_pairs.saturating_add(1));
    }

    let analysis = analyze_with_progress(handles, config.diff_config()).await?;

    let contract = (args.json || args.export.is_some())
        .then(|| serde_json::to_string_pretty(&analysis))
        .transpose()?;
    if let Some(path) = &args.export {
        fs::write(path, contract.as_deref().unwrap_or_default())
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("exported analysis contract to {}", path.display());
    }

    if args.json {
        println!("{}", contract.unwrap_or_default());
        return Ok(());
    }

    println!("{}", report::summarize_plan(&analysis));

    // Surface resumability against the full (untruncated) snapshot set.
    if args.max_pairs.is_none() {
        let state_dir = config.resolve_state_dir(args.state_dir);
        let tracker = ProgressTracker::open(&args.project, &state_dir);
        let hash = snapshots_hash(&snapshots)?;
        if tracker.is_valid_for(&hash) {
            println!("{}", tracker.status_line(analysis.units.len()));
        } else if tracker.completed_count() > 0 {
            println!(
                "Stored progress belongs to a different snapshot set; \
                 it will be discarded when narration next runs."
            );
        }
    }
    Ok(())
}

async fn run_report(config: &AppConfig, args: ReportArgs) -> Result<()> {
    let dir = config.resolve_snapshot_dir(args.dir)?;
    let snapshots = discover_snapshots(&dir, &args.project)?;
    let handles: Vec<SnapshotHandle> = snapshots
        .iter()
        .map(|s| SnapshotHandle::new(&s.label, &s.path))
        .collect();

    let analysis = analyze_with_progress(handles, config.diff_config()).await?;

    let state_dir = config.resolve_state_dir(args.state_dir);
    let tracker = ProgressTracker::open(&args.project, &state_dir);
    let progress = tracker
        .is_valid_for(&snapshots_hash(&snapshots)?)
        .then_some(&tracker);

    let labels: Vec<String> = snapshots.iter().map(|s| s.label.clone()).collect();
    let markdown = report::render_markdown(&args.project, &labels, &analysis, progress);

    match &args.output {
        Some(path) => {
            fs::write(path, markdown)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote report to {}", path.display());
        }
        None => println!("{markdown}"),
    }
    Ok(())
}

fn run_status(config: &AppConfig, args: ProjectArgs) -> Result<()> {
    let dir = config.resolve_snapshot_dir(args.dir)?;
    let snapshots = discover_snapshots(&dir, &args.project)?;
    let hash = snapshots_hash(&snapshots)?;

    let state_dir = config.resolve_state_dir(args.state_dir);
    let tracker = ProgressTracker::open(&args.project, &state_dir);

    if tracker.is_valid_for(&hash) {
        println!(
            "Progress record matches the current {} snapshots.",
            snapshots.len()
        );
        println!(
            "{} unit(s) completed; architectural summary {}.",
            tracker.completed_count(),
            if tracker.stable_summary().is_some() {
                "cached"
            } else {
                "not yet generated"
            }
        );
    } else if tracker.completed_count() == 0 && tracker.state().snapshots_hash.is_empty() {
        println!("No stored progress for '{}'.", args.project);
    } else {
        println!(
            "Stored progress is stale: the snapshot set changed since it was written. \
             It will be discarded when narration next runs."
        );
    }
    Ok(())
}

fn run_reset(config: &AppConfig, args: ProjectArgs) -> Result<()> {
    let state_dir = config.resolve_state_dir(args.state_dir);
    let mut tracker = ProgressTracker::open(&args.project, &state_dir);
    tracker.clear()?;
    println!("Cleared stored progress for '{}'.", args.project);
    Ok(())
}

/// Run the blocking analysis pipeline off the async runtime, with a
/// progress bar and Ctrl-C wired to cooperative cancellation.
async fn analyze_with_progress(
    handles: Vec<SnapshotHandle>,
    diff_config: DiffConfig,
) -> Result<TimelineAnalysis> {
    let cancel = CancelFlag::new();
    let cancel_on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received; stopping after the current transition");
            cancel_on_interrupt.cancel();
        }
    });

    let transitions = handles.len().saturating_sub(1);
    let bar = ProgressBar::new(transitions as u64);
    bar.set_style(
        ProgressStyle::with_template("{prefix:>10} [{bar:40}] {pos}/{len} {msg}")
            .expect("valid progress template")
            .progress_chars("=> "),
    );
    bar.set_prefix("diffing");

    let bar_for_task = bar.clone();
    let analysis = tokio::task::spawn_blocking(move || {
        analyze_timeline(&handles, &diff_config, &cancel, move |_, magnitude| {
            bar_for_task.set_message(format!("magnitude {magnitude:.4}"));
            bar_for_task.inc(1);
        })
    })
    .await
    .context("analysis task panicked")??;
    bar.finish_and_clear();

    Ok(analysis)
}

fn snapshots_hash(snapshots: &[SnapshotInfo]) -> Result<String> {
    compute_snapshots_hash(
        snapshots
            .iter()
            .map(|s| (s.label.as_str(), s.path.as_path())),
    )
    .context("failed to hash the snapshot set")
}
