//! The remote CRUD capability and its HTTP implementation.
//!
//! # Design
//! `RemoteTodoClient` is the seam between the session logic and the hosted
//! API. Controllers are generic over it, so tests run against `FakeRemote`
//! and the host runs against `HttpRemote`.
//!
//! `HttpRemote` pairs the stateless `TodoClient` with a `ureq` agent. ureq is
//! blocking, so each round-trip runs on tokio's blocking pool and the calling
//! task only awaits the join handle.

use std::future::Future;
use std::time::Duration;

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Created, TodoRecord, UpdateTodo};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Four fallible async operations against the todo service.
///
/// An `{"error"}` body and a failed round-trip both come back as `Err`.
pub trait RemoteTodoClient: Send + Sync {
    fn create(&self, payload: CreateTodo) -> impl Future<Output = Result<Created, ApiError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<TodoRecord, ApiError>> + Send;

    fn update(&self, key: &str, patch: UpdateTodo) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// `RemoteTodoClient` over real HTTP.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: TodoClient,
    agent: ureq::Agent,
}

impl HttpRemote {
    /// Construct the client once for the session.
    pub fn connect(config: &ClientConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() || config.api_url.trim().is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        // Status codes are data here; TodoClient interprets them.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .build()
            .new_agent();
        let client = TodoClient::new(&config.api_url, &config.api_key);
        tracing::info!(url = %client.base_url(), "CRUD client initialized");
        Ok(Self { client, agent })
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = ?request.method, path = %request.path, "sending request");
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || send(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

impl RemoteTodoClient for HttpRemote {
    async fn create(&self, payload: CreateTodo) -> Result<Created, ApiError> {
        let request = self.client.build_create_todo(&payload)?;
        let response = self.execute(request).await?;
        self.client.parse_create_todo(response)
    }

    async fn get(&self, key: &str) -> Result<TodoRecord, ApiError> {
        let request = self.client.build_get_todo(key);
        let response = self.execute(request).await?;
        self.client.parse_get_todo(response)
    }

    async fn update(&self, key: &str, patch: UpdateTodo) -> Result<(), ApiError> {
        let request = self.client.build_update_todo(key, &patch)?;
        let response = self.execute(request).await?;
        self.client.parse_update_todo(response)
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete_todo(key);
        let response = self.execute(request).await?;
        self.client.parse_delete_todo(response)
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Execute one request on the current (blocking) thread.
fn send(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let HttpRequest {
        method,
        path,
        headers,
        body,
    } = request;

    let result = match (method, body) {
        (HttpMethod::Get, _) => with_headers(agent.get(&path), &headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(&path), &headers).call(),
        (HttpMethod::Post, Some(body)) => with_headers(agent.post(&path), &headers).send(body.as_bytes()),
        (HttpMethod::Post, None) => with_headers(agent.post(&path), &headers).send_empty(),
        (HttpMethod::Put, Some(body)) => with_headers(agent.put(&path), &headers).send(body.as_bytes()),
        (HttpMethod::Put, None) => with_headers(agent.put(&path), &headers).send_empty(),
    };
    let mut response = result.map_err(|e| {
        tracing::warn!(error = %e, %path, "request failed");
        ApiError::Transport(e.to_string())
    })?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}
