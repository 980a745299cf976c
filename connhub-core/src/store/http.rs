//! REST client for the external persistence service.
//!
//! Endpoints live under `{base}{prefix}/connections`. Bodies are JSON with
//! camelCase field names; single records come wrapped as
//! `{"connection": {...}}`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ConnectionPage, ConnectionQuery, ConnectionStore};
use crate::config::ClientContext;
use crate::error::{StoreError, StoreResult};
use crate::models::Connection;

/// Longest response body kept in a `StoreError::Status`
const MAX_ERROR_BODY: usize = 512;

#[derive(Deserialize)]
struct ConnectionEnvelope {
    connection: Connection,
}

/// Connection store backed by the persistence service's REST API
#[derive(Debug, Clone)]
pub struct HttpConnectionStore {
    client: Client,
    context: ClientContext,
}

impl HttpConnectionStore {
    /// Creates a store for the given context
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the HTTP client cannot be initialised.
    pub fn new(context: ClientContext) -> StoreResult<Self> {
        let client = Client::builder()
            .user_agent(context.user_agent.as_str())
            .timeout(context.timeout)
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Self { client, context })
    }

    /// The context requests are sent with
    #[must_use]
    pub const fn context(&self) -> &ClientContext {
        &self.context
    }

    fn collection_url(&self) -> String {
        self.context.endpoint("/connections")
    }

    fn item_url(&self, id: Uuid) -> String {
        self.context.endpoint(&format!("/connections/{id}"))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.context.token {
            Some(ref token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, id: Option<Uuid>) -> StoreResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Persistence request failed");
                if e.is_connect() || e.is_timeout() {
                    StoreError::Unavailable(e.to_string())
                } else {
                    StoreError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::NotFound(id));
            }
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        warn!(status = status.as_u16(), "Persistence service returned an error");
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Query string pairs for a list request
fn query_pairs(query: &ConnectionQuery) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("page", query.effective_page().to_string()),
        ("limit", query.effective_limit().to_string()),
    ];
    if let Some(t) = query.connection_type {
        pairs.push(("type", t.as_str().to_string()));
    }
    if let Some(s) = query.status {
        pairs.push(("status", s.as_str().to_string()));
    }
    if let Some(ref p) = query.provider {
        pairs.push(("provider", p.clone()));
    }
    if let Some(ref s) = query.search {
        if !s.trim().is_empty() {
            pairs.push(("search", s.trim().to_string()));
        }
    }
    pairs
}

#[async_trait]
impl ConnectionStore for HttpConnectionStore {
    async fn insert(&self, connection: &Connection) -> StoreResult<Connection> {
        debug!(connection_id = %connection.id, "POST connection");
        let builder = self.client.post(self.collection_url()).json(connection);
        let response = self.send(builder, None).await?;
        Ok(Self::decode::<ConnectionEnvelope>(response).await?.connection)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Connection> {
        debug!(connection_id = %id, "GET connection");
        let response = self.send(self.client.get(self.item_url(id)), Some(id)).await?;
        Ok(Self::decode::<ConnectionEnvelope>(response).await?.connection)
    }

    async fn replace(&self, connection: &Connection) -> StoreResult<Connection> {
        debug!(connection_id = %connection.id, "PUT connection");
        let builder = self
            .client
            .put(self.item_url(connection.id))
            .json(connection);
        let response = self.send(builder, Some(connection.id)).await?;
        Ok(Self::decode::<ConnectionEnvelope>(response).await?.connection)
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        debug!(connection_id = %id, "DELETE connection");
        self.send(self.client.delete(self.item_url(id)), Some(id))
            .await
            .map(|_| ())
    }

    async fn list(&self, query: &ConnectionQuery) -> StoreResult<ConnectionPage> {
        let builder = self
            .client
            .get(self.collection_url())
            .query(&query_pairs(query));
        let response = self.send(builder, None).await?;
        Self::decode::<ConnectionPage>(response).await
    }
}
