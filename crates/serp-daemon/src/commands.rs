//! Command implementations for the serp binary.
//!
//! Handles:
//! - search/phrase: build the query, run it against the cluster, print JSON
//! - routes: list the route table
//! - show-config: print the effective configuration

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use serp_query::QueryStrategy;
use serp_search::pagination::parse_page;
use serp_search::{ApiResponse, ElasticsearchBackend, SearchParams, SearchPipeline, ROUTES};
use serp_types::{ConfigProvider, Settings};

use crate::cli::SearchArgs;

/// Load settings from all configuration layers and apply CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let provider = ConfigProvider::load(config_path).context("Failed to load configuration")?;
    let mut settings = provider
        .settings()
        .context("Failed to read configuration sections")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. Logs go to stderr.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Translate command-line options into pipeline parameters.
pub fn search_params(args: &SearchArgs) -> SearchParams {
    let mut params = SearchParams::new(args.query_text())
        .with_page(parse_page(&args.page))
        .with_explain(args.explain)
        .with_full_body(args.full_body);
    if !args.indices.is_empty() {
        params = params.with_indices(args.indices.clone());
    }
    if let Some(lang) = &args.lang {
        params = params.with_language(lang.clone());
    }
    params
}

/// Which strategy a search command uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Simple,
    Phrase { slop: Option<i64> },
}

/// Run a search command and print the JSON response.
pub async fn run_search(settings: &Settings, args: &SearchArgs, mode: SearchMode) -> Result<()> {
    let backend = ElasticsearchBackend::new(&settings.cluster)
        .context("Failed to create search backend client")?;
    info!(host = backend.host(), "Using search backend");
    let pipeline = SearchPipeline::new(settings, Arc::new(backend));

    let strategy: Box<dyn QueryStrategy> = match mode {
        SearchMode::Phrase { slop } => {
            let mut strategy = pipeline.phrase_strategy();
            if let Some(slop) = slop {
                strategy.set_slop(slop);
            }
            Box::new(strategy)
        }
        SearchMode::Simple => Box::new(pipeline.simple_strategy()),
    };

    let params = search_params(args);

    if args.dry_run {
        let prepared = pipeline
            .prepare(&params, strategy.as_ref())
            .context("Failed to build search request")?;
        let output = serde_json::json!({
            "indices": prepared.request.indices,
            "body": prepared.request.to_body(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let page = pipeline
        .search(&params, strategy.as_ref())
        .await
        .context("Search failed")?;

    let response = ApiResponse::from_page(&page, args.minimal);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Render the route table.
pub fn format_routes() -> String {
    ROUTES
        .iter()
        .map(|route| format!("{:<20} {:<8} {}", route.path, route.strategy, route.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn show_routes() {
    println!("{}", format_routes());
}

/// Render the effective configuration as TOML. Secrets are never included.
pub fn format_config(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to serialize configuration")
}

pub fn show_config(settings: &Settings) -> Result<()> {
    println!("{}", format_config(settings)?);
    Ok(())
}
