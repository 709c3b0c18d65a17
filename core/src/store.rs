//! In-memory session state: the ordered todo list and the notification slot.
//!
//! # Design
//! `SessionStore` never performs I/O. Each `apply_*` method takes the
//! already-settled outcome of a remote call, so the store can be exercised
//! without a runtime.
//!
//! Source of truth per operation:
//! - create: the request payload (locally entered key and value) plus the
//!   server-assigned id;
//! - fetch: the response payload;
//! - update: the existing record with the patched value from the request.
//!
//! `apply_create` does not de-duplicate. Two concurrent creates for one key
//! that both succeed remotely leave two entries; the store logs it.

use serde::Serialize;

use crate::error::TodoError;
use crate::types::{TodoRecord, UpdateTodo};

pub const ADDED: &str = "Todo added successfully!";
pub const FETCHED: &str = "Todo fetched successfully!";
pub const UPDATED: &str = "Todo updated successfully!";
pub const DELETED: &str = "Todo deleted successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    records: Vec<TodoRecord>,
    notification: Option<Notification>,
    loading: bool,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            notification: None,
            loading: true,
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TodoRecord] {
        &self.records
    }

    pub fn get(&self, key: &str) -> Option<&TodoRecord> {
        self.records.iter().find(|r| r.key == key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|r| r.key == key)
    }

    pub fn apply_create(&mut self, record: TodoRecord) {
        if self.position(&record.key).is_some() {
            tracing::warn!(key = %record.key, "created a todo whose key is already in the session");
        }
        self.records.push(record);
        self.notification = Some(Notification::success(ADDED));
    }

    /// Upsert: last fetched wins, position is kept.
    pub fn apply_fetch(&mut self, record: TodoRecord) {
        match self.position(&record.key) {
            Some(index) => self.records[index] = record,
            None => self.records.push(record),
        }
        self.notification = Some(Notification::success(FETCHED));
    }

    /// Replace the value of the record at `key`.
    ///
    /// An unknown key leaves the records untouched and raises an error
    /// notification.
    pub fn apply_update(&mut self, key: &str, patch: UpdateTodo) -> Result<(), TodoError> {
        let Some(index) = self.position(key) else {
            let err = TodoError::UnknownKey(key.to_string());
            self.report_error(err.to_string());
            return Err(err);
        };
        self.records[index].value = patch.value;
        self.notification = Some(Notification::success(UPDATED));
        Ok(())
    }

    /// Remove the record at `key`. Absent keys are a no-op.
    pub fn apply_delete(&mut self, key: &str) {
        self.records.retain(|r| r.key != key);
        self.notification = Some(Notification::success(DELETED));
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    pub fn dismiss(&mut self) {
        self.notification = None;
    }
}
