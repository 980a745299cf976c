//! Persistence boundary
//!
//! The registry never stores connections itself; it delegates to a
//! [`ConnectionStore`]. [`HttpConnectionStore`] talks to the external
//! persistence service, [`MemoryConnectionStore`] keeps everything in
//! process for tests and offline use.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use http::HttpConnectionStore;
pub use memory::MemoryConnectionStore;

use crate::error::StoreResult;
use crate::models::{Connection, ConnectionStatus, ConnectionType};

/// Default page size for list queries
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page a store is asked for
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Filter and paging for list queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionQuery {
    /// Only this type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<ConnectionType>,
    /// Only this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConnectionStatus>,
    /// Only this provider (case-insensitive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Case-insensitive substring of name, description, provider or a tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Page size
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_page() -> u32 {
    1
}

const fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for ConnectionQuery {
    fn default() -> Self {
        Self {
            connection_type: None,
            status: None,
            provider: None,
            search: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ConnectionQuery {
    /// Query for one page with no filters
    #[must_use]
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    /// Restricts to one type
    #[must_use]
    pub const fn with_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = Some(connection_type);
        self
    }

    /// Restricts to one status
    #[must_use]
    pub const fn with_status(mut self, status: ConnectionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to one provider
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Adds a search term
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Page number clamped to at least 1
    #[must_use]
    pub const fn effective_page(&self) -> u32 {
        if self.page == 0 { 1 } else { self.page }
    }

    /// Page size clamped to `1..=MAX_PAGE_LIMIT`
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Returns true if `connection` passes every filter
    #[must_use]
    pub fn matches(&self, connection: &Connection) -> bool {
        if self
            .connection_type
            .is_some_and(|t| t != connection.connection_type)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != connection.status) {
            return false;
        }
        if let Some(ref provider) = self.provider {
            if !connection.provider.eq_ignore_ascii_case(provider.trim()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                connection.name.to_lowercase().contains(&term)
                    || connection.provider.to_lowercase().contains(&term)
                    || connection
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
                    || connection
                        .tags
                        .iter()
                        .any(|t| t.to_lowercase().contains(&term))
            }
        }
    }

    /// Filters, orders and slices `connections` into one page
    ///
    /// Order is by creation time, then id.
    #[must_use]
    pub fn paginate(&self, connections: impl IntoIterator<Item = Connection>) -> ConnectionPage {
        let mut matching: Vec<Connection> =
            connections.into_iter().filter(|c| self.matches(c)).collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let page = self.effective_page();
        let limit = self.effective_limit();
        let total = matching.len();
        let start = (page as usize - 1).saturating_mul(limit as usize);
        let connections = matching
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();

        ConnectionPage {
            connections,
            total,
            page,
            limit,
        }
    }
}

/// One page of a list query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPage {
    /// Connections on this page
    pub connections: Vec<Connection>,
    /// Matching connections across all pages
    pub total: usize,
    /// Page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl ConnectionPage {
    /// Returns true if later pages exist
    #[must_use]
    pub const fn has_more(&self) -> bool {
        (self.page as usize).saturating_mul(self.limit as usize) < self.total
    }
}

/// Persistence service for connection records
///
/// Records round-trip every field of [`Connection`] unchanged.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Stores a new connection and returns the stored record
    async fn insert(&self, connection: &Connection) -> StoreResult<Connection>;

    /// Fetches one connection
    ///
    /// Returns `StoreError::NotFound` for unknown ids.
    async fn get(&self, id: Uuid) -> StoreResult<Connection>;

    /// Replaces an existing connection and returns the stored record
    async fn replace(&self, connection: &Connection) -> StoreResult<Connection>;

    /// Removes a connection
    async fn remove(&self, id: Uuid) -> StoreResult<()>;

    /// Lists one page of connections
    async fn list(&self, query: &ConnectionQuery) -> StoreResult<ConnectionPage>;

    /// Fetches every connection, page by page
    async fn all(&self) -> StoreResult<Vec<Connection>> {
        let mut connections = Vec::new();
        let mut page = 1;
        loop {
            let result = self
                .list(&ConnectionQuery::page(page, MAX_PAGE_LIMIT))
                .await?;
            let more = result.has_more() && !result.connections.is_empty();
            connections.extend(result.connections);
            if !more {
                return Ok(connections);
            }
            page += 1;
        }
    }
}
