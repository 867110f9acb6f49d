//! Static route table mapping request paths to query strategies.

use std::sync::Arc;

use serp_query::{PhraseStrategy, QueryStrategy, SimpleStrategy};
use serp_types::SearchSettings;

use crate::error::SearchError;

/// Builds the strategy serving a route.
pub type StrategyFactory = fn(Arc<SearchSettings>) -> Box<dyn QueryStrategy>;

/// One registered search route.
#[derive(Clone, Copy)]
pub struct Route {
    pub path: &'static str,
    /// Name of the strategy built by `factory`
    pub strategy: &'static str,
    pub description: &'static str,
    factory: StrategyFactory,
}

impl Route {
    pub fn build(&self, settings: Arc<SearchSettings>) -> Box<dyn QueryStrategy> {
        (self.factory)(settings)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn simple(settings: Arc<SearchSettings>) -> Box<dyn QueryStrategy> {
    Box::new(SimpleStrategy::new(settings))
}

fn phrase(settings: Arc<SearchSettings>) -> Box<dyn QueryStrategy> {
    Box::new(PhraseStrategy::new(settings))
}

/// All search routes.
pub static ROUTES: &[Route] = &[
    Route {
        path: "/",
        strategy: "simple",
        description: "Result page for keyword search",
        factory: simple,
    },
    Route {
        path: "/api/v1/_search",
        strategy: "simple",
        description: "Keyword search API",
        factory: simple,
    },
    Route {
        path: "/api/v1/_phrases",
        strategy: "phrase",
        description: "Phrase search API",
        factory: phrase,
    },
];

/// Look up a route by exact path; a trailing slash is ignored.
pub fn find_route(path: &str) -> Option<&'static Route> {
    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        other => other,
    };
    ROUTES.iter().find(|route| route.path == trimmed)
}

/// Build the strategy registered for `path`.
pub fn strategy_for(
    path: &str,
    settings: Arc<SearchSettings>,
) -> Result<Box<dyn QueryStrategy>, SearchError> {
    find_route(path)
        .map(|route| route.build(settings))
        .ok_or_else(|| SearchError::UnknownRoute(path.to_string()))
}
