//! In-process connection store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConnectionPage, ConnectionQuery, ConnectionStore};
use crate::error::{StoreError, StoreResult};
use crate::models::Connection;

/// Connection store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    connections: RwLock<HashMap<Uuid, Connection>>,
}

impl MemoryConnectionStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `connections`
    #[must_use]
    pub fn with_connections(connections: impl IntoIterator<Item = Connection>) -> Self {
        Self {
            connections: RwLock::new(connections.into_iter().map(|c| (c.id, c)).collect()),
        }
    }

    /// Number of stored connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns true if nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

#[async_trait]
impl ConnectionStore for MemoryConnectionStore {
    async fn insert(&self, connection: &Connection) -> StoreResult<Connection> {
        let mut connections = self.connections.write().await;
        if connections.contains_key(&connection.id) {
            return Err(StoreError::Status {
                status: 409,
                body: format!("connection {} already exists", connection.id),
            });
        }
        connections.insert(connection.id, connection.clone());
        Ok(connection.clone())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Connection> {
        self.connections
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn replace(&self, connection: &Connection) -> StoreResult<Connection> {
        let mut connections = self.connections.write().await;
        match connections.get_mut(&connection.id) {
            Some(existing) => {
                *existing = connection.clone();
                Ok(connection.clone())
            }
            None => Err(StoreError::NotFound(connection.id)),
        }
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        self.connections
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, query: &ConnectionQuery) -> StoreResult<ConnectionPage> {
        let snapshot: Vec<Connection> = self.connections.read().await.values().cloned().collect();
        Ok(query.paginate(snapshot))
    }

    async fn all(&self) -> StoreResult<Vec<Connection>> {
        Ok(self.connections.read().await.values().cloned().collect())
    }
}
