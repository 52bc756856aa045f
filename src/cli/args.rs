//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// orform - Structured OR records from dictated transcripts
#[derive(Parser, Debug)]
#[command(name = "orform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to read the transcript from (stdin when neither is given)
#[derive(Args, Debug, Clone)]
pub struct TranscriptInput {
    /// Transcript text
    #[arg(long, conflicts_with = "transcript")]
    pub text: Option<String>,

    /// File containing the transcript
    #[arg(long)]
    pub transcript: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a structured OR record from a transcript
    Extract {
        #[command(flatten)]
        input: TranscriptInput,

        /// JSON file with raw model predictions (skips the configured back-end)
        #[arg(short, long)]
        predictions: Option<PathBuf>,

        /// Print compact JSON instead of pretty JSON
        #[arg(long)]
        compact: bool,
    },

    /// Align raw predictions to whitespace tokens as BIO tags
    Align {
        #[command(flatten)]
        input: TranscriptInput,

        /// JSON file with raw model predictions
        #[arg(short, long)]
        predictions: PathBuf,

        /// Print tokens and tags as JSON
        #[arg(long)]
        json: bool,
    },

    /// Correction data management
    #[command(subcommand)]
    Corrections(CorrectionsCommand),

    /// Model back-end management
    #[command(subcommand)]
    Model(ModelCommand),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum CorrectionsCommand {
    /// Validate and append one corrected sentence
    ///
    /// Tags come either from `--tags` or from aligned model predictions with
    /// `--set INDEX:TAG` edits applied on top.
    Add {
        #[command(flatten)]
        input: TranscriptInput,

        /// Space-separated tags, one per token
        #[arg(long, conflicts_with = "predictions")]
        tags: Option<String>,

        /// JSON file with raw model predictions to start from
        #[arg(short, long)]
        predictions: Option<PathBuf>,

        /// Correct one predicted tag, e.g. `--set 2:B-DATE` (repeatable)
        #[arg(long = "set", value_name = "INDEX:TAG", requires = "predictions")]
        edits: Vec<String>,

        /// Name of the reviewer
        #[arg(long)]
        by: Option<String>,
    },

    /// Check a corrections file for length mismatches and unknown tags
    Validate {
        /// Corrections file (defaults to labels.corrections)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show tag frequencies and reviewers
    Analyze {
        /// Corrections file (defaults to labels.corrections)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Merge corrections into the training data
    Merge {
        /// Corrections file (defaults to labels.corrections)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Keep duplicate token sequences
        #[arg(long)]
        keep_duplicates: bool,
    },

    /// Write an analysis and validation report as JSON
    Report {
        /// Corrections file (defaults to labels.corrections)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Report output path
        #[arg(short, long, default_value = "corrections_report.json")]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Show information about the configured back-end
    Info,

    /// Check the configured back-end without running it
    Validate,

    /// List registered back-end types
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
