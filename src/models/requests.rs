//! Request DTOs for the pNode API
//!
//! Defines the query strings accepted by the list endpoint.

use serde::Deserialize;

/// Query string for `GET /pnodes`
///
/// `refresh` is kept as raw text so the extractor never rejects it. Only
/// `true`, `1` and `yes` (any case) force a refresh; a bare `?refresh` or any
/// other value is accepted as false.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub refresh: Option<String>,
}

impl ListQuery {
    /// True when the caller asked to bypass the cache read.
    pub fn force_refresh(&self) -> bool {
        self.refresh
            .as_deref()
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }
}
