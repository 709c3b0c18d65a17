use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub value: f64,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub value: f64,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub value: Option<f64>,
}

/// Settings for one mock API instance.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub api_key: String,
    /// Number of authorized requests served before every call answers 429.
    /// `None` means unlimited.
    pub credits: Option<u32>,
}

impl ServerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            credits: None,
        }
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = Some(credits);
        self
    }
}

pub struct AppState {
    config: ServerConfig,
    todos: RwLock<HashMap<String, Todo>>,
    credits_used: AtomicU32,
}

pub type Db = Arc<AppState>;

/// Error body in the shape the hosted API uses: `{"error": "..."}`.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn app(config: ServerConfig) -> Router {
    let state: Db = Arc::new(AppState {
        config,
        todos: RwLock::new(HashMap::new()),
        credits_used: AtomicU32::new(0),
    });
    Router::new()
        .route("/todos", post(create_todo))
        .route(
            "/todos/{tx_hash}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ServerConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(config)).await
}

/// Check the API key, then spend one credit.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Failure> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.config.api_key.as_str()) {
        tracing::warn!("rejected request with invalid API key");
        return Err(Failure::new(StatusCode::UNAUTHORIZED, "Invalid API key"));
    }
    if let Some(limit) = state.config.credits {
        let used = state.credits_used.fetch_add(1, Ordering::SeqCst);
        if used >= limit {
            tracing::warn!(limit, "API credits exhausted");
            return Err(Failure::new(
                StatusCode::TOO_MANY_REQUESTS,
                "API credits exhausted",
            ));
        }
    }
    Ok(())
}

fn check_value(value: f64) -> Result<(), Failure> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Value must be positive",
        ))
    }
}

async fn create_todo(
    State(state): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<serde_json::Value>), Failure> {
    authorize(&state, &headers)?;
    check_value(input.value)?;
    if input.tx_hash.trim().is_empty() {
        return Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "txHash cannot be empty",
        ));
    }

    let mut todos = state.todos.write().await;
    if todos.contains_key(&input.tx_hash) {
        return Err(Failure::new(
            StatusCode::CONFLICT,
            "Todo with this txHash already exists",
        ));
    }
    let todo = Todo {
        id: Uuid::new_v4(),
        tx_hash: input.tx_hash,
        value: input.value,
    };
    tracing::info!(tx_hash = %todo.tx_hash, id = %todo.id, "created todo");
    let id = todo.id;
    todos.insert(todo.tx_hash.clone(), todo);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn get_todo(
    State(state): State<Db>,
    headers: HeaderMap,
    Path(tx_hash): Path<String>,
) -> Result<Json<Todo>, Failure> {
    authorize(&state, &headers)?;
    let todos = state.todos.read().await;
    todos
        .get(&tx_hash)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Todo not found"))
}

async fn update_todo(
    State(state): State<Db>,
    headers: HeaderMap,
    Path(tx_hash): Path<String>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<serde_json::Value>, Failure> {
    authorize(&state, &headers)?;
    let mut todos = state.todos.write().await;
    let todo = todos
        .get_mut(&tx_hash)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Todo not found"))?;
    if let Some(value) = input.value {
        check_value(value)?;
        todo.value = value;
    }
    Ok(Json(json!({ "status": "updated" })))
}

async fn delete_todo(
    State(state): State<Db>,
    headers: HeaderMap,
    Path(tx_hash): Path<String>,
) -> Result<Json<serde_json::Value>, Failure> {
    authorize(&state, &headers)?;
    let mut todos = state.todos.write().await;
    todos
        .remove(&tx_hash)
        .map(|_| Json(json!({ "status": "deleted" })))
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Todo not found"))
}
