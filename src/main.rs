//! # vaultkeep
//!
//! CLI front-end over the [`vaultkeep`] library crate. Argument parsing and
//! human-readable table formatting live only here — everything that touches
//! the store or the filesystem lives in the library, where it can be tested
//! without a process boundary.
//!
//! ## Comparison with `but-next` (predecessor)
//!
//! | Feature                | but-next            | vaultkeep                |
//! |-------------------------|----------------------|---------------------------|
//! | Storage substrate       | JSON manifests + FS  | SQLite (ACID)            |
//! | Digest                  | BLAKE3               | SHA-256                  |
//! | Dedup scope             | per target           | global, cross-snapshot    |
//! | Compression / encryption| zstd/gzip, AES-GCM   | out of scope              |
//! | Corruption detection    | blob presence only   | re-hash + presence        |
//! | Prune                   | keep-N per target    | prune by snapshot id      |

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use vaultkeep::{check, list, prune, restore, snapshot, store::Store};

const DEFAULT_DB_PATH: &str = "./backups.db";

/// vaultkeep — a content-addressed incremental backup engine
#[derive(Parser, Debug)]
#[command(
    name = "vaultkeep",
    version,
    about = "A content-addressed incremental backup engine",
    long_about = "vaultkeep captures point-in-time snapshots of a directory tree into a \
                  content-addressed SQLite store, deduplicating identical files across \
                  every snapshot it has ever taken, and restores any snapshot back to a \
                  bit-identical tree."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose per-file output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a snapshot of a directory tree.
    Snapshot {
        /// Directory to snapshot.
        #[arg(long)]
        target_directory: PathBuf,

        /// Path to the backup database.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },

    /// List all snapshots with their sizes.
    List {
        /// Path to the backup database.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },

    /// Restore a snapshot to a directory.
    Restore {
        /// Snapshot id to restore.
        #[arg(long)]
        snapshot_number: i64,

        /// Directory to restore into.
        #[arg(long)]
        output_directory: PathBuf,

        /// Path to the backup database.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },

    /// Delete a snapshot and reclaim any content it alone referenced.
    Prune {
        /// Snapshot id to delete.
        #[arg(long)]
        snapshot: i64,

        /// Path to the backup database.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },

    /// Verify that every stored blob matches its recorded hash.
    Check {
        /// Path to the backup database.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", colored::Colorize::red("error:"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> vaultkeep::Result<ExitCode> {
    match &cli.command {
        Command::Snapshot {
            target_directory,
            db_path,
        } => cmd_snapshot(db_path, target_directory, cli.verbose),
        Command::List { db_path } => cmd_list(db_path),
        Command::Restore {
            snapshot_number,
            output_directory,
            db_path,
        } => cmd_restore(db_path, *snapshot_number, output_directory, cli.verbose),
        Command::Prune { snapshot, db_path } => cmd_prune(db_path, *snapshot),
        Command::Check { db_path } => cmd_check(db_path),
    }
}

// ─── Command implementations ────────────────────────────────────────────────

fn cmd_snapshot(
    db_path: &std::path::Path,
    target_directory: &std::path::Path,
    verbose: bool,
) -> vaultkeep::Result<ExitCode> {
    let mut store = Store::open(db_path)?;

    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );

    let report = snapshot::snapshot(
        &mut store,
        target_directory,
        &snapshot::SnapshotOptions::default(),
        |path| {
            pb.set_message(path.to_string());
            pb.tick();
            if verbose {
                log::debug!("processed {path}");
            }
        },
    )?;
    pb.finish_and_clear();

    eprintln!(
        "{} snapshot {} ({} files, {} new, {} deduplicated)",
        colored::Colorize::green("✓"),
        colored::Colorize::bold(report.id.to_string().as_str()),
        report.total_files,
        report.new_files,
        report.deduplicated_files,
    );

    for warning in &report.warnings {
        match warning {
            snapshot::Warning::TooLarge { path, size } => {
                log::warn!("skipped {} ({size} bytes exceeds cap)", path.display());
                eprintln!(
                    "  {} skipped {} ({size} bytes exceeds cap)",
                    colored::Colorize::yellow("!"),
                    path.display(),
                );
            }
            snapshot::Warning::PermissionDenied { path } => {
                log::warn!("skipped unreadable {}", path.display());
                eprintln!(
                    "  {} skipped unreadable {}",
                    colored::Colorize::yellow("!"),
                    path.display(),
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_list(db_path: &std::path::Path) -> vaultkeep::Result<ExitCode> {
    let store = Store::open(db_path)?;
    let report = list::list(store.connection())?;

    if report.rows.is_empty() {
        eprintln!("No snapshots found.");
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!(
        "{:>6}  {:20}  {:>12}  {:>12}",
        "id", "taken_at", "size", "distinct_size"
    );
    eprintln!("{}", "─".repeat(56));
    for row in &report.rows {
        eprintln!(
            "{:>6}  {:20}  {:>12}  {:>12}",
            row.id,
            row.taken_at,
            format_size(row.size),
            format_size(row.distinct_size),
        );
    }
    eprintln!();
    eprintln!("  total stored: {}", format_size(report.total_size));

    Ok(ExitCode::SUCCESS)
}

fn cmd_restore(
    db_path: &std::path::Path,
    snapshot_id: i64,
    output_directory: &std::path::Path,
    verbose: bool,
) -> vaultkeep::Result<ExitCode> {
    let store = Store::open(db_path)?;
    let report = restore::restore(&store, snapshot_id, output_directory)?;

    if verbose {
        log::debug!(
            "restored {} files ({} bytes) into {}",
            report.files_written,
            report.bytes_written,
            output_directory.display(),
        );
    }

    eprintln!(
        "{} restored {} files ({}) into {}",
        colored::Colorize::green("✓"),
        report.files_written,
        format_size(report.bytes_written),
        output_directory.display(),
    );

    Ok(ExitCode::SUCCESS)
}

fn cmd_prune(db_path: &std::path::Path, snapshot_id: i64) -> vaultkeep::Result<ExitCode> {
    let mut store = Store::open(db_path)?;
    let report = prune::prune(&mut store, snapshot_id)?;

    eprintln!(
        "{} pruned snapshot {}, freed {}",
        colored::Colorize::green("✓"),
        snapshot_id,
        format_size(report.bytes_freed),
    );

    Ok(ExitCode::SUCCESS)
}

fn cmd_check(db_path: &std::path::Path) -> vaultkeep::Result<ExitCode> {
    let store = Store::open(db_path)?;
    store.integrity_check()?;

    let report = check::check(store.connection())?;

    for hash in &report.corrupt_hashes {
        eprintln!("{} corrupt content: {hash}", colored::Colorize::red("✗"));
    }
    for hash in &report.missing_hashes {
        eprintln!(
            "{} file reference with no content: {hash}",
            colored::Colorize::red("✗"),
        );
    }

    if report.is_healthy() {
        eprintln!("{} store is healthy", colored::Colorize::green("✓"));
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PiB")
}
