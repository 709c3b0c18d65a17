//! Client session core for the hosted todo CRUD service.
//!
//! # Overview
//! A page holds an ordered list of todo records (keyed by transaction hash),
//! a single notification slot with auto-dismissal, and the controls that
//! change them: add, fetch, and edit-in-place. Controls validate input, make
//! one remote call, and apply its settled outcome to the session.
//!
//! # Design
//! - `TodoClient` builds and parses HTTP requests without I/O; `HttpRemote`
//!   executes them. Both sit behind the `RemoteTodoClient` trait.
//! - `SessionStore` holds the mutation rules and does no I/O.
//! - `SessionHandle` pairs the store with the `NotificationTimer` and
//!   schedules expiries on tokio.
//! - The remote client is created once at startup and injected into every
//!   control; `Page::Failed` is the terminal state when that fails.

pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod page;
pub mod remote;
pub mod session;
pub mod store;
pub mod timer;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod fake;

pub use client::TodoClient;
pub use config::{ClientConfig, NotificationSettings};
pub use error::{ApiError, ConfigError, TodoError, ValidationError};
pub use forms::{AddTodoForm, FetchTodoForm, ItemMode, TodoItem};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use page::{ItemView, Page, PageView, TodoPage};
pub use remote::{HttpRemote, RemoteTodoClient};
pub use session::{SessionHandle, SessionSnapshot};
pub use store::{Notification, SessionStore, Severity};
pub use timer::{NotificationTimer, TimerState};
pub use types::{CreateTodo, Created, TodoRecord, UpdateTodo};
