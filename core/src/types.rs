//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the hosted API's JSON schema, where the addressing key
//! travels as `txHash`. They are defined independently from the mock-server
//! crate; integration tests catch schema drift between the two.

use serde::{Deserialize, Serialize};

/// A todo record as held in the session and returned by `get`.
///
/// `key` is the transaction hash that addresses the record; it never changes
/// once created. `id` is assigned by the server and only carried along.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoRecord {
    #[serde(rename = "txHash")]
    pub key: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TodoRecord {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateTodo {
    #[serde(rename = "txHash")]
    pub key: String,
    pub value: f64,
}

/// Successful create response. Only the server-assigned id is returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: String,
}

/// Patch for an existing todo. Only `value` is mutable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UpdateTodo {
    pub value: f64,
}
