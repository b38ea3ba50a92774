//! Semantic search flow.

mod controller;
mod model;

pub use controller::{SEARCH_FAILED, SearchController};
pub use model::{
    DEFAULT_MAX_RESULTS, MAX_MAX_RESULTS, MIN_MAX_RESULTS, SearchForm, SearchQuery, SearchResultSet,
};
