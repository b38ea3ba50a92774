//! Read-only view of the application state for renderers.

use lodestone_core::ViewState;
use lodestone_core::files::FileRecord;
use lodestone_core::search::SearchResultSet;
use lodestone_core::session::User;
use serde::Serialize;

/// Everything a renderer needs to draw the current screen.
///
/// Taken from each component in turn, so a snapshot captured while flows are
/// in flight can mix pre- and post-completion values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSnapshot {
    pub view: ViewState,
    pub user: Option<User>,
    pub files: Vec<FileRecord>,
    pub search_results: Option<SearchResultSet>,
    pub error: Option<String>,
    pub authenticated: bool,
    /// True while a sign-in, upload or search is awaiting the service.
    pub busy: bool,
}

impl AppSnapshot {
    /// Greeting line shown in the header.
    pub fn greeting(&self) -> Option<String> {
        self.user.as_ref().map(|user| format!("Welcome, {}!", user.username))
    }
}
