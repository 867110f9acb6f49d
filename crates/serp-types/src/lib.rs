//! # serp-types
//!
//! Shared configuration and error types for the serp search frontend.
//!
//! - [`ConfigProvider`]: layered, read-only configuration with dot-path access
//! - Typed configuration sections for the cluster, both search strategies and
//!   result pagination
//! - [`SerpError`]: error type for configuration handling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use serp_types::{ConfigProvider, SimpleSearchSettings};
//!
//! let provider = ConfigProvider::load(None)?;
//! let simple: SimpleSearchSettings = provider.section("search.default_simple")?;
//! ```

pub mod config;
pub mod error;
pub mod settings;

pub use crate::config::ConfigProvider;
pub use error::SerpError;
pub use settings::{
    ClusterSettings, FactorModifier, FieldBoost, FieldValueFactor, IndexAlias, MainField,
    PaginationSettings, Penalties, PenaltyField, PhraseField, PhraseSearchSettings, QueryFilter,
    RangeFilter, SearchSettings, SerpSettings, Settings, SimpleSearchSettings,
};
