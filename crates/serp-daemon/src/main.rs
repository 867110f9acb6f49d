//! serp: web search frontend
//!
//! # Usage
//!
//! ```bash
//! serp search [--page N] [--index NAME]... [--lang LANG] [--explain] QUERY...
//! serp phrase [--slop N] QUERY...
//! serp routes
//! serp show-config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/serp/config.toml)
//! 3. File given with --config
//! 4. Environment variables (SERP_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use serp_daemon::{
    init_logging, load_settings, run_search, show_config, show_routes, Cli, Commands, SearchMode,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Search(args) => {
            run_search(&settings, &args, SearchMode::Simple).await?;
        }
        Commands::Phrase { args, slop } => {
            run_search(&settings, &args, SearchMode::Phrase { slop }).await?;
        }
        Commands::Routes => {
            show_routes();
        }
        Commands::ShowConfig => {
            show_config(&settings)?;
        }
    }

    Ok(())
}
