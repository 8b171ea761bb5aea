//! Command implementations for the liveness CLI.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::sync::Arc;

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{LivenessError, Result};
use crate::lookup::DocId;
use crate::reconcile::{SegmentPaths, SegmentReconciler, read_docid_list};
use crate::storage::file::FileStorageConfig;
use crate::storage::{Storage, StorageConfig, StorageFactory};

/// Execute a CLI command, writing reports to standard output.
pub fn execute_command(args: LivenessArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute_command_to(&args, &mut out)
}

/// Execute a CLI command, writing reports to `out`.
pub fn execute_command_to<W: Write>(args: &LivenessArgs, out: &mut W) -> Result<()> {
    let storage = StorageFactory::create(StorageConfig::File(FileStorageConfig::new(".")))?;

    match &args.command {
        Command::Extract(extract_args) => extract_killed(extract_args, args, storage, out),
        Command::Mark(mark_args) => mark_killed(mark_args, args, storage, out),
        Command::Stats(stats_args) => show_stats(stats_args, args, storage, out),
    }
}

/// Print the docids of killed rows.
fn extract_killed<W: Write>(
    extract_args: &ExtractArgs,
    cli_args: &LivenessArgs,
    storage: Arc<dyn Storage>,
    out: &mut W,
) -> Result<()> {
    let paths = extract_args
        .segment_paths()
        .ok_or_else(|| LivenessError::other("both SPM_PATH and SPT_PATH are required"))?;

    let report = SegmentReconciler::new(storage, paths).extract_killed()?;
    info!(
        "{} killed rows, {} killed docids",
        report.killed_rows,
        report.docids.len()
    );

    match cli_args.output_format {
        OutputFormat::Human => write_docid_report(&report.docids, out),
        OutputFormat::Json => output_result("Killed documents", &report, cli_args, out),
    }
}

/// Mark the listed docids as killed.
fn mark_killed<W: Write>(
    mark_args: &MarkArgs,
    cli_args: &LivenessArgs,
    storage: Arc<dyn Storage>,
    out: &mut W,
) -> Result<()> {
    let docids = load_docids(mark_args)?;
    if docids.is_empty() {
        info!("No document IDs to process.");
    }

    let reconciler =
        SegmentReconciler::new(storage, SegmentPaths::from_prefix(&mark_args.table_path));
    let outcome = reconciler.mark_killed(&docids, &mark_args.mark_config())?;

    if outcome.resolved.is_empty() {
        warn!("No valid row IDs to mark as killed.");
    }
    if outcome.persisted {
        info!(
            "Successfully marked {} documents as killed",
            outcome.resolved.len()
        );
        info!("Updated file: {}", reconciler.paths().bitmap);
    }

    if cli_args.output_format == OutputFormat::Json {
        output_result("Mark summary", &outcome, cli_args, out)?;
    }

    Ok(())
}

/// Summarize a segment.
fn show_stats<W: Write>(
    stats_args: &StatsArgs,
    cli_args: &LivenessArgs,
    storage: Arc<dyn Storage>,
    out: &mut W,
) -> Result<()> {
    let reconciler =
        SegmentReconciler::new(storage, SegmentPaths::from_prefix(&stats_args.table_path));
    let stats = reconciler.stats()?;
    output_result("Segment Statistics", &stats, cli_args, out)
}

fn load_docids(mark_args: &MarkArgs) -> Result<BTreeSet<DocId>> {
    if mark_args.reads_stdin() {
        info!("Reading document IDs from standard input...");
        return read_docid_list(io::stdin().lock());
    }

    let path = &mark_args.docids_file;
    info!("Reading document IDs from {}...", path.display());
    let file = File::open(path).map_err(|e| {
        LivenessError::storage(format!("Document IDs file {}: {e}", path.display()))
    })?;
    read_docid_list(BufReader::new(file))
}
