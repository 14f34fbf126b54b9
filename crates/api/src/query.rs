//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped via `clamp_limit` / `clamp_offset` before they reach a
/// store; a missing `limit` falls back to the configured page size.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Resolve to a `(limit, offset)` pair safe to hand to a list query.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64) {
        (
            stock_db::repositories::clamp_limit(self.limit, default_limit),
            stock_db::repositories::clamp_offset(self.offset),
        )
    }
}
