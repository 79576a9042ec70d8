//! stockroom - publish an image catalog into a static storefront page.
//!
//! Usage:
//!   stockroom [PATH]              Scan, update the page, commit and push
//!   stockroom update [PATH]       Same, with options
//!   stockroom scan [PATH]         Show the inventory tree
//!   stockroom export [PATH]       Print the inventory as JSON
//!   stockroom fix-names [PATH]    Replace spaces in image file names
//!   stockroom --help              Show help

use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, bail};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use stockroom_core::{FolderNode, Inventory, InventoryNode};
use stockroom_publish::{
    PageUpdate, PublishOutcome, SiteConfig, encode_inventory, normalize_filenames, publish,
    update_page,
};
use stockroom_scan::{InventoryScanner, ScanProgress};
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Parser)]
#[command(
    name = "stockroom",
    version,
    about = "Publish an image catalog into a static storefront page",
    long_about = "stockroom scans a folder of product images, writes the resulting \
                  inventory into the storefront page, and commits and pushes the site.\n\n\
                  Run `stockroom [PATH]` to do all of it, or use subcommands for \
                  individual steps."
)]
struct Cli {
    /// Site root (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Config file (defaults to stockroom.toml in the site root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan, write the inventory into the page, then commit and push
    Update {
        /// Site root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Page to update, relative to the site root
        #[arg(short, long)]
        page: Option<PathBuf>,

        /// Commit without pushing
        #[arg(long)]
        no_push: bool,

        /// Only update the page; leave git alone
        #[arg(long, conflicts_with = "no_push")]
        no_git: bool,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Scan and show the inventory tree
    Scan {
        /// Site root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Show all entries (no depth limit on display)
        #[arg(short, long)]
        all: bool,
    },

    /// Export the inventory as JSON
    Export {
        /// Site root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace spaces with underscores in image file names
    FixNames {
        /// Site root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Show what would be renamed without renaming
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Some(Command::Update {
            path,
            page,
            no_push,
            no_git,
            message,
        }) => {
            let options = UpdateOptions {
                page,
                no_push,
                no_git,
                message,
            };
            run_update(&path, config, options)?;
        }
        Some(Command::Scan { path, depth, all }) => {
            run_scan(&path, config, if all { None } else { Some(depth) })?;
        }
        Some(Command::Export { path, output }) => {
            run_export(&path, config, output)?;
        }
        Some(Command::FixNames { path, dry_run }) => {
            run_fix_names(&path, config, dry_run)?;
        }
        None => {
            run_update(&cli.path, config, UpdateOptions::default())?;
        }
    }

    Ok(())
}

/// RUST_LOG wins; otherwise `--verbose` selects DEBUG for stockroom crates.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,stockroom={level},stockroom_scan={level},stockroom_publish={level}"
        ))
    });
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

#[derive(Default)]
struct UpdateOptions {
    page: Option<PathBuf>,
    no_push: bool,
    no_git: bool,
    message: Option<String>,
}

/// Resolve the site root and its configuration.
fn load_site(path: &Path, config: Option<&Path>) -> Result<(PathBuf, SiteConfig)> {
    let root = path.canonicalize().context("Invalid path")?;
    let site = match config {
        Some(file) => SiteConfig::from_file(file),
        None => SiteConfig::load(&root),
    }
    .context("Failed to load site config")?;
    Ok((root, site))
}

/// Scan the site with its configured policy.
fn scan_site(root: &Path, site: &SiteConfig) -> Result<Inventory> {
    eprintln!("Scanning {}...", root.display());

    let config = site.scan_config(root).context("Invalid scan config")?;
    let scanner = InventoryScanner::new();
    let reporter = spawn_progress_reporter(scanner.subscribe());
    let result = scanner.scan(&config);
    drop(scanner);
    let _ = reporter.join();
    let inventory = result.context("Scan failed")?;

    if inventory.has_warnings() {
        eprintln!(
            "{} warning(s) during scan; {} folder(s) could not be read",
            inventory.warnings.len(),
            inventory.stats.unreadable_dirs
        );
    }
    Ok(inventory)
}

/// Print a running count on stderr while a large catalog is scanned.
///
/// Snapshots arrive every few hundred files, so small catalogs print nothing.
fn spawn_progress_reporter(
    mut rx: broadcast::Receiver<ScanProgress>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut printed = false;
        loop {
            match rx.blocking_recv() {
                Ok(progress) if progress.finished => break,
                Ok(progress) => {
                    eprint!(
                        "\r  {} files in {} folders ({:.0} files/s)",
                        progress.files_scanned,
                        progress.dirs_scanned,
                        progress.files_per_second()
                    );
                    printed = true;
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        if printed {
            eprintln!();
        }
    })
}

/// Scan, inject into the page, then commit and push.
fn run_update(path: &Path, config: Option<&Path>, options: UpdateOptions) -> Result<()> {
    let (root, mut site) = load_site(path, config)?;
    if let Some(page) = options.page {
        site.page = page;
    }
    if let Some(message) = options.message {
        site.git.message = message;
    }
    if options.no_push {
        site.git.push = false;
    }

    let inventory = scan_site(&root, &site)?;
    println!(
        "Found {} files in {} folders",
        inventory.total_files(),
        inventory.total_folders()
    );

    let page = site.page_path(&root);
    match update_page(&page, inventory.to_document()).context("Failed to update page")? {
        PageUpdate::Unchanged => println!("{} already up to date", page.display()),
        PageUpdate::Written { bytes } => println!("Updated {} ({bytes} bytes)", page.display()),
    }

    if options.no_git {
        return Ok(());
    }

    match publish(&root, &site.git).context("Git publish failed")? {
        PublishOutcome::NothingToCommit => println!("No new changes to upload"),
        PublishOutcome::Committed { commit_id, branch } => {
            println!("Committed {} on {branch}", short_id(&commit_id));
        }
        PublishOutcome::Pushed {
            commit_id,
            remote,
            branch,
        } => {
            println!("Pushed {} to {remote}/{branch}", short_id(&commit_id));
        }
    }

    Ok(())
}

/// Scan and print the inventory tree.
fn run_scan(path: &Path, config: Option<&Path>, max_depth: Option<u32>) -> Result<()> {
    let (root, site) = load_site(path, config)?;
    let inventory = scan_site(&root, &site)?;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", root.display());
    println!(
        " {} files, {} folders ({} skipped, {} ignored)",
        inventory.total_files(),
        inventory.total_folders(),
        inventory.stats.skipped_entries,
        inventory.stats.ignored_entries
    );
    println!(
        " Scanned at {} in {:.2}s",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        inventory.scan_duration.as_secs_f64()
    );
    println!("{}", "─".repeat(60));
    println!();

    print_folder(&inventory.root, 0, max_depth.unwrap_or(u32::MAX));

    Ok(())
}

/// Export the inventory to JSON.
fn run_export(path: &Path, config: Option<&Path>, output: Option<PathBuf>) -> Result<()> {
    let (root, site) = load_site(path, config)?;
    let inventory = scan_site(&root, &site)?;
    let json = encode_inventory(inventory.to_document())?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Normalize image file names.
fn run_fix_names(path: &Path, config: Option<&Path>, dry_run: bool) -> Result<()> {
    let (root, site) = load_site(path, config)?;
    let options = site
        .rename_options(&root)
        .context("Invalid scan config")?
        .with_dry_run(dry_run);

    eprintln!("Checking {} for files with spaces...", root.display());
    let report = normalize_filenames(&root, &options).context("Rename failed")?;

    let verb = if dry_run { "Would rename" } else { "Renamed" };
    for renamed in &report.renamed {
        println!(
            " {verb}: {} -> {}",
            display_relative(&root, &renamed.from),
            display_relative(&root, &renamed.to)
        );
    }
    for failure in &report.failed {
        eprintln!(" Failed: {failure}");
    }

    if report.is_clean() {
        println!("No files needed fixing.");
    } else {
        println!(
            "{} file(s) {}, {} failed",
            report.renamed.len(),
            if dry_run { "to rename" } else { "renamed" },
            report.failed.len()
        );
    }

    if !report.failed.is_empty() && !dry_run {
        bail!("{} file(s) could not be renamed", report.failed.len());
    }
    Ok(())
}

/// Print a folder and its children.
fn print_folder(folder: &FolderNode, depth: u32, max_depth: u32) {
    let indent = "  ".repeat(depth as usize);
    println!(
        "{}▼ {:<40} {:>6} files {:>4} folders",
        indent,
        truncate(&format!("{}/", folder.name), 40),
        folder.total_files,
        folder.total_folders
    );

    if depth >= max_depth {
        return;
    }

    for child in &folder.children {
        match child {
            InventoryNode::Folder(sub) => print_folder(sub, depth + 1, max_depth),
            InventoryNode::File(file) => {
                let indent = "  ".repeat(depth as usize + 1);
                println!("{}  {}", indent, file.title);
            }
        }
    }
}

fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn short_id(commit_id: &str) -> &str {
    commit_id.get(..7).unwrap_or(commit_id)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
