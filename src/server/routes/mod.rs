//! Route handlers, grouped by dashboard page.

pub mod chat;
pub mod emails;
pub mod fees;

use serde::Deserialize;

/// `?q=` on the search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}
