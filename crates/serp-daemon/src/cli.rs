//! CLI argument parsing for the serp binary.
//!
//! `--config` and `--log-level` override every other configuration source.

use clap::{Args, Parser, Subcommand};

/// Web search frontend
///
/// Builds ranked two-phase queries and runs them against the search cluster.
#[derive(Parser, Debug)]
#[command(name = "serp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/serp/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Keyword search
    Search(SearchArgs),

    /// Exact phrase search
    Phrase {
        #[command(flatten)]
        args: SearchArgs,

        /// Allowed distance between phrase terms (clamped to max_slop)
        #[arg(long)]
        slop: Option<i64>,
    },

    /// List registered search routes
    Routes,

    /// Print the effective configuration as TOML
    ShowConfig,
}

/// Options shared by all search commands.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Query text, directives such as `site:example.org` included
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Result page (malformed values mean page 1)
    #[arg(short, long, default_value = "1")]
    pub page: String,

    /// Index or alias to search (repeatable)
    #[arg(short, long = "index")]
    pub indices: Vec<String>,

    /// Search language (default from config)
    #[arg(long)]
    pub lang: Option<String>,

    /// Include score explanations
    #[arg(long)]
    pub explain: bool,

    /// Return stored body text
    #[arg(long)]
    pub full_body: bool,

    /// Only print identifiers and URIs
    #[arg(long)]
    pub minimal: bool,

    /// Print the backend request instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl SearchArgs {
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}
