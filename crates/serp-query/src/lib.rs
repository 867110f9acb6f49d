//! # serp-query
//!
//! Turns a raw user query into backend queries.
//!
//! ## Components
//! - [`IndexSelector`]: allow-list, default and alias handling for indices
//! - [`QueryStringParser`]: `keyword:value` directive extraction and
//!   `AND`/`OR` normalization
//! - [`QueryStrategy`]: two-phase query construction, implemented by
//!   [`SimpleStrategy`] and [`PhraseStrategy`]
//! - [`Query`]: typed query tree rendered to backend JSON
//!
//! Everything in this crate is synchronous and free of I/O.

pub mod builder;
pub mod dsl;
pub mod error;
pub mod fields;
pub mod index;
pub mod parser;

pub use builder::{FieldHighlightSpec, PhraseStrategy, QueryStrategy, SimpleStrategy};
pub use dsl::{BoolQuery, Operator, Query, QueryFlag};
pub use error::QueryError;
pub use index::IndexSelector;
pub use parser::{normalize_operators, Directive, ParsedQuery, QueryStringParser};
