//! Command-line argument parsing for SiteBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::rag::SearchParams;

/// SiteBuddy - answer questions about a company from its own website
#[derive(Parser, Debug)]
#[command(name = "sitebuddy")]
#[command(version)]
#[command(about = "Grounded answers about a company, with links to its site", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Rebuild the vector index from the content file
    Build,

    /// Answer a single question
    Ask {
        /// The question to answer
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum similarity score (inclusive)
        #[arg(long, conflicts_with = "no_threshold")]
        min_score: Option<f32>,

        /// Keep every retrieved passage regardless of score
        #[arg(long)]
        no_threshold: bool,

        /// Print the passages used for the answer
        #[arg(long)]
        show_sources: bool,
    },

    /// Interactive question loop
    Chat,

    /// Display effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Commands {
    /// Apply per-call overrides from `ask` flags to the configured search
    pub fn search_overrides(&self, base: SearchParams) -> SearchParams {
        match self {
            Commands::Ask {
                top_k,
                min_score,
                no_threshold,
                ..
            } => SearchParams {
                top_k: top_k.unwrap_or(base.top_k),
                min_score: if *no_threshold {
                    None
                } else {
                    min_score.or(base.min_score)
                },
            },
            _ => base,
        }
    }
}

impl Verbosity {
    /// Default tracing filter for this level
    pub fn log_level(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
