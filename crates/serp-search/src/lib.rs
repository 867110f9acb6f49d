//! # serp-search
//!
//! Runs searches built by `serp-query` and turns backend hits into pages of
//! results.
//!
//! ## Components
//! - [`SearchBackend`]: async backend seam, with [`ElasticsearchBackend`]
//!   over HTTP and [`MockBackend`] for tests
//! - [`ResultMapper`]: hit to [`SearchResult`] conversion with same-host
//!   grouping hints
//! - [`Paginator`]: page clamping and navigation entries
//! - [`SearchPipeline`]: parse, build, execute and map in one call
//! - [`ApiResponse`]: JSON API body
//! - [`routes`]: request path to strategy table

pub mod api;
pub mod backend;
pub mod elastic;
pub mod error;
pub mod mapper;
pub mod pagination;
pub mod pipeline;
pub mod request;
pub mod routes;

pub use api::{ApiMeta, ApiResponse, ApiResult};
pub use backend::{BackendResponse, MockBackend, MockOutcome, RawHit, SearchBackend};
pub use elastic::ElasticsearchBackend;
pub use error::SearchError;
pub use mapper::{Explanation, ResultMapper, SearchResult};
pub use pagination::{NavEntry, PageInfo, Paginator};
pub use pipeline::{PreparedSearch, ResultPage, SearchParams, SearchPipeline};
pub use request::SearchRequest;
pub use routes::{find_route, strategy_for, Route, ROUTES};
