//! HTTP gateway client.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use knet_core::{Agent, Fragment, Project, Relation, Tag, Transform, TrustVote, Uuid};

use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;
use crate::types::{
    page_params, Health, Page, PageRequest, RelationQuery, ResourcePressure, SearchQuery, TagQuery,
};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HttpGateway`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL, e.g. `https://hub.example:8443/api`.
    pub base_url: String,
    /// Bearer token sent on every request.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl HttpConfig {
    /// Settings for `base_url` with no token and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Gateway reached over HTTP with JSON bodies.
///
/// Errors are not retried. Non-success responses are mapped to
/// [`GatewayError::Remote`] carrying the gateway's own message when the
/// body contains one.
pub struct HttpGateway {
    base_url: String,
    client: Client,
    pressure: Mutex<Option<ResourcePressure>>,
}

impl HttpGateway {
    /// Build a client from `config`.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| GatewayError::InvalidConfig(format!("bad token: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            pressure: Mutex::new(None),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(path, self.client.get(self.url(path))).await
    }

    async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        self.send(path, self.client.get(self.url(path)).query(params)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(path, self.client.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(path, self.client.put(self.url(path)).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(path, error = %e, "gateway request failed");
            GatewayError::Http(e)
        })?;
        self.handle_response(path, response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, path: &str, response: Response) -> Result<T> {
        self.record_pressure(&response);

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!(path, status, %message, "gateway rejected request");
            return Err(GatewayError::Remote { status, message });
        }

        let body = response.json().await?;
        Ok(body)
    }

    fn record_pressure(&self, response: &Response) {
        let headers = response.headers();
        // Only the latest response counts; no header clears the signal.
        let signal = header_str(headers, ResourcePressure::LEVEL_HEADER).map(|level| ResourcePressure {
            level,
            hint: header_str(headers, ResourcePressure::HINT_HEADER),
        });
        if let Some(signal) = signal.as_ref().filter(|s| s.is_elevated()) {
            tracing::warn!(level = %signal.level, hint = ?signal.hint, "gateway under resource pressure");
        }
        let mut slot = self.pressure.lock().unwrap_or_else(|e| e.into_inner());
        *slot = signal;
    }
}

fn header_str(headers: &header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Pull a human message out of an error body: `detail`, `error` or
/// `message` when the body is a JSON object, the raw text otherwise.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "error", "message"] {
            match map.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn health(&self) -> Result<Health> {
        self.get("/health").await
    }

    async fn create_fragment(&self, fragment: &Fragment) -> Result<Fragment> {
        self.post("/fragments", fragment).await
    }

    async fn get_fragment(&self, id: Uuid) -> Result<Fragment> {
        self.get(&format!("/fragments/{id}")).await
    }

    async fn search_fragments(&self, query: &SearchQuery) -> Result<Page<Fragment>> {
        self.post("/fragments/search", query).await
    }

    async fn create_relation(&self, relation: &Relation) -> Result<Relation> {
        self.post("/relations", relation).await
    }

    async fn query_relations(&self, query: &RelationQuery) -> Result<Page<Relation>> {
        self.get_with("/relations", &query.params()).await
    }

    async fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        self.post("/tags", tag).await
    }

    async fn get_tag(&self, id: Uuid) -> Result<Tag> {
        self.get(&format!("/tags/{id}")).await
    }

    async fn find_tags(&self, query: &TagQuery) -> Result<Page<Tag>> {
        self.get_with("/tags", &query.params()).await
    }

    async fn create_transform(&self, transform: &Transform) -> Result<Transform> {
        self.post("/transforms", transform).await
    }

    async fn get_transform(&self, id: Uuid) -> Result<Transform> {
        self.get(&format!("/transforms/{id}")).await
    }

    async fn list_transforms(&self, page: &PageRequest) -> Result<Page<Transform>> {
        self.get_with("/transforms", &page_params(page)).await
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent> {
        self.post("/agents", agent).await
    }

    async fn get_agent(&self, id: Uuid) -> Result<Agent> {
        self.get(&format!("/agents/{id}")).await
    }

    async fn update_agent(&self, agent: &Agent) -> Result<Agent> {
        self.put(&format!("/agents/{}", agent.id), agent).await
    }

    async fn cast_vote(&self, vote: &TrustVote) -> Result<TrustVote> {
        self.post("/votes", vote).await
    }

    async fn create_project(&self, project: &Project) -> Result<Project> {
        self.post("/projects", project).await
    }

    async fn get_project(&self, id: Uuid) -> Result<Project> {
        self.get(&format!("/projects/{id}")).await
    }

    async fn list_projects(&self, page: &PageRequest) -> Result<Page<Project>> {
        self.get_with("/projects", &page_params(page)).await
    }

    fn pressure(&self) -> Option<ResourcePressure> {
        self.pressure.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
