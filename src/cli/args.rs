//! Command line argument parsing for the liveness CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::reconcile::{MarkConfig, SegmentPaths};

/// liveness - inspect and edit the killed-row state of index segments
#[derive(Parser, Debug, Clone)]
#[command(name = "liveness")]
#[command(about = "Inspect and edit the killed-row state of search index segments")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct LivenessArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl LivenessArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n.saturating_add(1),
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the docids of killed rows, one per line, ascending
    Extract(ExtractArgs),

    /// Mark the docids listed in a file as killed
    Mark(MarkArgs),

    /// Show a summary of a segment's liveness files
    Stats(StatsArgs),
}

/// Arguments for extracting killed docids
#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    /// Path to the .spm bitmap file
    #[arg(value_name = "SPM_PATH", required_unless_present = "table")]
    pub spm_path: Option<PathBuf>,

    /// Path to the .spt lookup table file
    #[arg(value_name = "SPT_PATH", required_unless_present = "table")]
    pub spt_path: Option<PathBuf>,

    /// Table prefix resolving to <TABLE>.spm and <TABLE>.spt
    #[arg(long, value_name = "TABLE", conflicts_with_all = ["spm_path", "spt_path"])]
    pub table: Option<String>,
}

impl ExtractArgs {
    /// Resolve the segment file names.
    pub fn segment_paths(&self) -> Option<SegmentPaths> {
        if let Some(table) = &self.table {
            return Some(SegmentPaths::from_prefix(table));
        }
        match (&self.spm_path, &self.spt_path) {
            (Some(spm), Some(spt)) => Some(SegmentPaths::new(
                spm.to_string_lossy(),
                spt.to_string_lossy(),
            )),
            _ => None,
        }
    }
}

/// Arguments for marking docids as killed
#[derive(Parser, Debug, Clone)]
pub struct MarkArgs {
    /// Table prefix resolving to <TABLE_PATH>.spm and <TABLE_PATH>.spt
    #[arg(value_name = "TABLE_PATH")]
    pub table_path: String,

    /// File with one docid per line ("-" reads standard input)
    #[arg(value_name = "DOCIDS_FILE")]
    pub docids_file: PathBuf,

    /// Resolve and apply marks without writing the bitmap back
    #[arg(long)]
    pub dry_run: bool,

    /// Fail instead of growing the bitmap for rows past its end
    #[arg(long)]
    pub no_grow: bool,

    /// How many missing docids to list in the warning
    #[arg(long, default_value = "10")]
    pub max_reported_missing: usize,
}

impl MarkArgs {
    /// Build the workflow configuration from the flags.
    pub fn mark_config(&self) -> MarkConfig {
        MarkConfig {
            allow_grow: !self.no_grow,
            dry_run: self.dry_run,
            max_reported_missing: self.max_reported_missing,
        }
    }

    /// Whether the docid list comes from standard input.
    pub fn reads_stdin(&self) -> bool {
        self.docids_file.as_os_str() == "-"
    }
}

/// Arguments for segment statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Table prefix resolving to <TABLE_PATH>.spm and <TABLE_PATH>.spt
    #[arg(value_name = "TABLE_PATH")]
    pub table_path: String,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_extract_positional_paths() {
        let args =
            LivenessArgs::try_parse_from(["liveness", "extract", "t.0.spm", "t.0.spt"]).unwrap();

        if let Command::Extract(extract_args) = args.command {
            let paths = extract_args.segment_paths().unwrap();
            assert_eq!(paths, SegmentPaths::new("t.0.spm", "t.0.spt"));
        } else {
            panic!("Expected Extract command");
        }
    }

    #[test]
    fn test_extract_table_prefix() {
        let args =
            LivenessArgs::try_parse_from(["liveness", "extract", "--table", "/idx/t/t.0"]).unwrap();

        if let Command::Extract(extract_args) = args.command {
            let paths = extract_args.segment_paths().unwrap();
            assert_eq!(paths, SegmentPaths::from_prefix("/idx/t/t.0"));
        } else {
            panic!("Expected Extract command");
        }
    }

    #[test]
    fn test_extract_requires_paths() {
        assert!(LivenessArgs::try_parse_from(["liveness", "extract"]).is_err());
        assert!(
            LivenessArgs::try_parse_from(["liveness", "extract", "a.spm", "--table", "t"]).is_err()
        );
    }

    #[test]
    fn test_mark_command() {
        let args = LivenessArgs::try_parse_from([
            "liveness",
            "mark",
            "/idx/t/t.0",
            "docids.txt",
            "--dry-run",
            "--no-grow",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.verbosity(), 3);
        if let Command::Mark(mark_args) = args.command {
            assert_eq!(mark_args.table_path, "/idx/t/t.0");
            assert_eq!(mark_args.docids_file, PathBuf::from("docids.txt"));
            assert!(!mark_args.reads_stdin());

            let config = mark_args.mark_config();
            assert!(config.dry_run);
            assert!(!config.allow_grow);
            assert_eq!(config.max_reported_missing, 10);
        } else {
            panic!("Expected Mark command");
        }
    }

    #[test]
    fn test_mark_from_stdin() {
        let args = LivenessArgs::try_parse_from(["liveness", "mark", "t.0", "-"]).unwrap();
        if let Command::Mark(mark_args) = args.command {
            assert!(mark_args.reads_stdin());
        } else {
            panic!("Expected Mark command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = LivenessArgs::try_parse_from(["liveness", "stats", "t.0"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = LivenessArgs::try_parse_from(["liveness", "-v", "stats", "t.0"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args =
            LivenessArgs::try_parse_from(["liveness", "-q", "-vvv", "stats", "t.0"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            LivenessArgs::try_parse_from(["liveness", "stats", "t.0", "--format", "json"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
    }
}
