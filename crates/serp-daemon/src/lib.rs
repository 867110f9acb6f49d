//! serp command-line frontend.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (search, phrase, routes, show-config)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, SearchArgs};
pub use commands::{
    init_logging, load_settings, run_search, show_config, show_routes, SearchMode,
};
