//! CLI definition and batch run entry point for nzb-cleaner.
//!
//! Conflicting add/remove flag pairs are rejected by clap before any file is
//! touched; everything that can fail before the batch starts (path
//! resolution, destination creation) is a fatal error, while per-file
//! failures inside the batch only affect their own file.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use crate::discovery;
use crate::pipeline::{self, BatchSummary, TransformResult};
use crate::transform::TransformOptions;

/// How often the destination prompt re-asks on invalid input before giving up.
const MAX_PROMPT_ATTEMPTS: usize = 5;

/// Batch cleaner for NZB files.
///
/// Reconciles passwords and titles between NZB metadata and the
/// `name{{password}}.nzb` filename convention, then writes the cleaned
/// files under the computed names.
#[derive(Parser, Debug)]
#[command(name = "nzb-cleaner")]
#[command(about = "Clean NZB files: reconcile passwords and titles between metadata and filenames")]
#[command(version)]
#[command(
    long_about = "nzb-cleaner batch-processes NZB files, moving passwords and titles between\n\
                  the file metadata and the name{{password}}.nzb filename convention.\n\n\
                  Example usage:\n  nzb-cleaner ./downloads ./cleaned --apm --rpf"
)]
pub struct Cli {
    /// Path to the NZB file to be cleaned or a folder containing NZB files.
    pub nzb_file: String,

    /// Destination path where the new NZB file(s) should be saved
    /// (defaults to the source directory).
    pub dest_path: Option<String>,

    /// Add password from filename ({{password}}) to NZB file metadata.
    #[arg(long = "apm", conflicts_with = "remove_pw_from_meta")]
    pub add_pw_to_meta: bool,

    /// Add password from NZB file metadata to filename ({{password}}).
    #[arg(long = "apf", conflicts_with = "remove_pw_from_filename")]
    pub add_pw_to_filename: bool,

    /// Add the filename to NZB file metadata as title.
    #[arg(long = "atm", conflicts_with = "remove_title_from_meta")]
    pub add_title_to_meta: bool,

    /// Use the title in the NZB file metadata as the filename for the NZB file.
    #[arg(long = "utf")]
    pub use_title_for_filename: bool,

    /// Remove password from the NZB file metadata.
    #[arg(long = "rpm")]
    pub remove_pw_from_meta: bool,

    /// Remove password from the filename ({{password}}).
    #[arg(long = "rpf")]
    pub remove_pw_from_filename: bool,

    /// Remove the title from the NZB file metadata.
    #[arg(long = "rtm")]
    pub remove_title_from_meta: bool,

    /// Enable verbose output.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the batch summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// The default tracing filter derived from the verbosity flag. `RUST_LOG`
    /// still takes precedence in main.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Snapshot of the enabled rules, built once after clap validation.
    fn to_options(&self) -> TransformOptions {
        TransformOptions {
            add_pw_to_meta: self.add_pw_to_meta,
            add_pw_to_filename: self.add_pw_to_filename,
            add_title_to_meta: self.add_title_to_meta,
            use_title_for_filename: self.use_title_for_filename,
            remove_pw_from_meta: self.remove_pw_from_meta,
            remove_pw_from_filename: self.remove_pw_from_filename,
            remove_title_from_meta: self.remove_title_from_meta,
        }
    }
}

/// JSON shape of the batch summary printed under `--json`.
#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    status: &'a str,
    #[serde(flatten)]
    summary: &'a BatchSummary,
    failures: Vec<JsonFailure<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonFailure<'a> {
    file: &'a str,
    reason: String,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like verbosity) before
/// running the batch.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the batch.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the batch with the parsed arguments.
///
/// This is the main entry point for the nzb-cleaner CLI. Returns an error
/// only for fatal pre-batch failures; per-file failures are reported in the
/// summary and leave the exit code untouched.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let options = cli.to_options();
    if options.is_noop() {
        anyhow::bail!("no operation flags provided, nothing to do");
    }

    let (filenames, source_dir) = discovery::discover(Path::new(&cli.nzb_file))?;
    let dest_dir = resolve_destination(&cli.dest_path, &source_dir)?;

    info!(
        files = filenames.len(),
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        "Starting batch"
    );

    let tasks = pipeline::build_tasks(filenames, source_dir, dest_dir, options);
    let (summary, results) = pipeline::run_batch(tasks).await;

    info!(
        total = summary.total,
        written = summary.written,
        failed = summary.failed,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        files_per_second = summary.files_per_second().unwrap_or(0.0),
        "Batch completed"
    );

    if cli.json {
        let failures = results
            .iter()
            .filter_map(|result| match result {
                TransformResult::Failed { filename, error } => Some(JsonFailure {
                    file: filename,
                    reason: error.to_string(),
                }),
                TransformResult::Written(_) => None,
            })
            .collect();
        let output = JsonSummary {
            status: if summary.failed == 0 { "ok" } else { "partial" },
            summary: &summary,
            failures,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

/// Resolves the destination directory, creating it after interactive
/// confirmation when it does not exist yet.
fn resolve_destination(
    dest_path: &Option<String>,
    source_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let Some(dest) = dest_path else {
        return Ok(source_dir.to_path_buf());
    };
    let dest = PathBuf::from(dest);
    if !dest.exists() {
        let stdin = std::io::stdin();
        if !confirm_create(&dest, stdin.lock())? {
            anyhow::bail!("path creation declined by user");
        }
        std::fs::create_dir_all(&dest)
            .map_err(|err| anyhow::anyhow!("failed to create path '{}': {err}", dest.display()))?;
        info!(path = %dest.display(), "Created destination path");
    }
    Ok(dest)
}

/// Asks whether the destination path should be created, re-prompting on
/// invalid input a bounded number of times.
fn confirm_create(path: &Path, input: impl BufRead) -> anyhow::Result<bool> {
    println!("Destination path '{}' does not exist.", path.display());
    let mut lines = input.lines();
    for _ in 0..MAX_PROMPT_ATTEMPTS {
        println!("Do you want to create it? (y/n): ");
        let line = match lines.next() {
            Some(line) => line?,
            None => anyhow::bail!("failed to read input: end of input"),
        };
        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => warn!("Invalid input. Please enter 'y' or 'n'."),
        }
    }
    anyhow::bail!("too many invalid answers to the create-path prompt")
}
