//! Error types for the todo client.
//!
//! # Design
//! Errors fall into three user-facing classes. `ConfigError` is terminal and
//! puts the page into its failed state. `ValidationError` is raised before any
//! remote call. `ApiError` covers everything that can go wrong once a call is
//! issued; a `{"error": ...}` body from the service is kept verbatim in
//! `ApiError::Remote` so it can be shown to the user.

use thiserror::Error;

/// Errors returned by `TodoClient` parse methods and `RemoteTodoClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 without an error message.
    #[error("resource not found")]
    NotFound,

    /// The service answered with an `{"error": ...}` body.
    #[error("{0}")]
    Remote(String),

    /// The server returned a non-2xx status the client does not recognize.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// Message shown in a notification: the service's own text when there is
    /// one, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Remote(message) if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Startup configuration problems. Terminal for the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API Key or URL not found")]
    MissingCredentials,

    #[error("API URL is not usable: {0}")]
    InvalidUrl(String),

    #[error("failed to initialize the CRUD client: {0}")]
    Init(String),
}

/// Local input failures, caught before any remote call.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task text cannot be empty")]
    EmptyText,

    #[error("Value must be positive")]
    NonPositiveValue,

    #[error("Todo Txhash cannot be empty")]
    EmptyKey,

    #[error("Task text cannot be empty and value must be positive")]
    InvalidEdit,
}

/// Outcome of a failed controller or session operation.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("Todo {0} is not in this session")]
    UnknownKey(String),

    /// The control already has a call in flight.
    #[error("operation already in progress")]
    Busy,
}
