//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only the base URL and API key and carries no mutable
//! state between calls. Each CRUD operation is split into a `build_*` method
//! that produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the round-trip.
//!
//! The service reports failures as `{"error": "..."}`, sometimes with a 2xx
//! status. Every `parse_*` checks for that shape first, so an error body is
//! never mistaken for a payload.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Created, TodoRecord, UpdateTodo};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Characters escaped when a txHash is placed in a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
    api_key: String,
}

impl TodoClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todo_path(&self, key: &str) -> String {
        format!(
            "{}/todos/{}",
            self.base_url,
            utf8_percent_encode(key, PATH_SEGMENT)
        )
    }

    fn auth_header(&self) -> (String, String) {
        (API_KEY_HEADER.to_string(), self.api_key.clone())
    }

    fn json_headers(&self) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), "application/json".to_string()),
            self.auth_header(),
        ]
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/todos", self.base_url),
            headers: self.json_headers(),
            body: Some(body),
        })
    }

    pub fn build_get_todo(&self, key: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.todo_path(key),
            headers: vec![self.auth_header()],
            body: None,
        }
    }

    pub fn build_update_todo(&self, key: &str, patch: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(patch).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: self.todo_path(key),
            headers: self.json_headers(),
            body: Some(body),
        })
    }

    pub fn build_delete_todo(&self, key: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.todo_path(key),
            headers: vec![self.auth_header()],
            body: None,
        }
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Created, ApiError> {
        check_status(&response, &[200, 201])?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<TodoRecord, ApiError> {
        check_status(&response, &[200])?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }
}

/// Map `{"error"}` bodies and unexpected status codes to `ApiError`.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), ApiError> {
    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(&response.body) {
        return Err(ApiError::Remote(error));
    }
    if expected.contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
