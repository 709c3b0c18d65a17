//! Form controllers: add, fetch, and edit-in-place for one record.
//!
//! # Design
//! Each controller validates locally, issues exactly one remote call, and
//! hands the settled outcome to the session. A controller owns a `loading`
//! flag for the duration of its own call; a second submit on the same
//! control is rejected with `TodoError::Busy`, while other controls stay
//! free to run concurrently.
//!
//! The session is only touched after the call settles. Dropping an in-flight
//! `submit` future therefore applies nothing, and the drop guard re-enables
//! the control.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ApiError, TodoError, ValidationError};
use crate::remote::RemoteTodoClient;
use crate::session::SessionHandle;
use crate::types::{CreateTodo, TodoRecord, UpdateTodo};

pub const CREATE_FAILED: &str = "Failed to create todo";
pub const FETCH_FAILED: &str = "Failed to fetch todo";
pub const FETCH_UNREACHABLE: &str = "Failed to fetch todo. Please check the ID and try again.";
pub const UPDATE_FAILED: &str = "Failed to update todo";
pub const DELETE_FAILED: &str = "Failed to delete todo";

/// Holds a control's `loading` flag for the length of one call.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn begin(flag: &'a AtomicBool) -> Result<Self, TodoError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(TodoError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

pub fn validate_new(text: &str, value: f64) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if !is_positive(value) {
        return Err(ValidationError::NonPositiveValue);
    }
    Ok(())
}

pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    Ok(())
}

pub fn validate_edit(key: &str, value: f64) -> Result<(), ValidationError> {
    if key.trim().is_empty() || !is_positive(value) {
        return Err(ValidationError::InvalidEdit);
    }
    Ok(())
}

/// Report a validation failure and convert it for the caller.
fn rejected(session: &SessionHandle, err: ValidationError) -> TodoError {
    tracing::debug!(error = %err, "input rejected");
    session.failed(err.to_string());
    err.into()
}

/// Report a remote failure and convert it for the caller.
fn remote_failed(session: &SessionHandle, err: ApiError, message: String) -> TodoError {
    tracing::warn!(error = %err, "remote call failed");
    session.failed(message);
    err.into()
}

pub struct AddTodoForm<C> {
    remote: Arc<C>,
    session: SessionHandle,
    loading: AtomicBool,
}

impl<C: RemoteTodoClient> AddTodoForm<C> {
    pub fn new(remote: Arc<C>, session: SessionHandle) -> Self {
        Self {
            remote,
            session,
            loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Create a todo keyed by `text`.
    ///
    /// The record added to the session is built from the entered text and
    /// value plus the id the service assigned.
    pub async fn submit(&self, text: &str, value: f64) -> Result<TodoRecord, TodoError> {
        let guard = InFlight::begin(&self.loading)?;
        if let Err(err) = validate_new(text, value) {
            return Err(rejected(&self.session, err));
        }

        let payload = CreateTodo {
            key: text.to_string(),
            value,
        };
        let result = self.remote.create(payload).await;
        drop(guard);

        match result {
            Ok(created) => {
                tracing::info!(key = %text, id = %created.id, "todo created");
                let record = TodoRecord::new(text, value).with_id(created.id);
                self.session.created(record.clone());
                Ok(record)
            }
            Err(err) => {
                let message = err.user_message(CREATE_FAILED);
                Err(remote_failed(&self.session, err, message))
            }
        }
    }
}

pub struct FetchTodoForm<C> {
    remote: Arc<C>,
    session: SessionHandle,
    loading: AtomicBool,
}

impl<C: RemoteTodoClient> FetchTodoForm<C> {
    pub fn new(remote: Arc<C>, session: SessionHandle) -> Self {
        Self {
            remote,
            session,
            loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Fetch a todo by txHash and upsert the response into the session.
    pub async fn submit(&self, key: &str) -> Result<TodoRecord, TodoError> {
        let guard = InFlight::begin(&self.loading)?;
        if let Err(err) = validate_key(key) {
            return Err(rejected(&self.session, err));
        }

        let result = self.remote.get(key).await;
        drop(guard);

        match result {
            Ok(record) => {
                tracing::info!(key = %record.key, "todo fetched");
                self.session.fetched(record.clone());
                Ok(record)
            }
            Err(err) => {
                // Only the service's own message is worth showing; anything
                // else means the call never produced a record.
                let message = match err {
                    ApiError::Remote(_) => err.user_message(FETCH_FAILED),
                    _ => FETCH_UNREACHABLE.to_string(),
                };
                Err(remote_failed(&self.session, err, message))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemMode {
    Display,
    Editing { draft: f64 },
}

/// Edit-in-place controller for the record at `key`.
pub struct TodoItem<C> {
    key: String,
    remote: Arc<C>,
    session: SessionHandle,
    mode: Mutex<ItemMode>,
    loading: AtomicBool,
}

impl<C: RemoteTodoClient> TodoItem<C> {
    pub fn new(key: impl Into<String>, remote: Arc<C>, session: SessionHandle) -> Self {
        Self {
            key: key.into(),
            remote,
            session,
            mode: Mutex::new(ItemMode::Display),
            loading: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The record as the session currently holds it.
    pub fn record(&self) -> Option<TodoRecord> {
        self.session.record(&self.key)
    }

    fn mode_lock(&self) -> MutexGuard<'_, ItemMode> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> ItemMode {
        *self.mode_lock()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode(), ItemMode::Editing { .. })
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Switch to edit mode with the current value as the draft.
    pub fn begin_edit(&self) -> Result<(), TodoError> {
        if self.is_loading() {
            return Err(TodoError::Busy);
        }
        let value = self
            .record()
            .map(|r| r.value)
            .ok_or_else(|| TodoError::UnknownKey(self.key.clone()))?;
        *self.mode_lock() = ItemMode::Editing { draft: value };
        Ok(())
    }

    /// Change the draft value. Ignored outside edit mode.
    pub fn set_draft(&self, value: f64) {
        let mut mode = self.mode_lock();
        if let ItemMode::Editing { draft } = &mut *mode {
            *draft = value;
        }
    }

    pub fn cancel_edit(&self) -> Result<(), TodoError> {
        if self.is_loading() {
            return Err(TodoError::Busy);
        }
        *self.mode_lock() = ItemMode::Display;
        Ok(())
    }

    /// Send the draft value. On success the item leaves edit mode; on
    /// failure it stays in edit mode with the draft intact.
    pub async fn save(&self) -> Result<(), TodoError> {
        let guard = InFlight::begin(&self.loading)?;
        let ItemMode::Editing { draft } = self.mode() else {
            tracing::debug!(key = %self.key, "save outside edit mode ignored");
            return Ok(());
        };
        if let Err(err) = validate_edit(&self.key, draft) {
            return Err(rejected(&self.session, err));
        }

        let patch = UpdateTodo { value: draft };
        let result = self.remote.update(&self.key, patch).await;
        drop(guard);

        match result {
            Ok(()) => {
                tracing::info!(key = %self.key, value = draft, "todo updated");
                self.session.updated(&self.key, patch)?;
                *self.mode_lock() = ItemMode::Display;
                Ok(())
            }
            Err(err) => {
                let message = err.user_message(UPDATE_FAILED);
                Err(remote_failed(&self.session, err, message))
            }
        }
    }

    /// Delete the record remotely, then drop it from the session.
    pub async fn delete(&self) -> Result<(), TodoError> {
        let guard = InFlight::begin(&self.loading)?;
        let result = self.remote.delete(&self.key).await;
        drop(guard);

        match result {
            Ok(()) => {
                tracing::info!(key = %self.key, "todo deleted");
                self.session.deleted(&self.key);
                Ok(())
            }
            Err(err) => {
                let message = err.user_message(DELETE_FAILED);
                Err(remote_failed(&self.session, err, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::NotificationSettings;
    use crate::fake::{Call, FakeRemote, Op};
    use crate::store::{Notification, Severity, ADDED, DELETED, FETCHED, UPDATED};

    fn setup(remote: FakeRemote) -> (Arc<FakeRemote>, SessionHandle) {
        let session = SessionHandle::new(NotificationSettings::default());
        (Arc::new(remote), session)
    }

    // --- add ---

    #[tokio::test]
    async fn add_success_appends_entered_record() {
        let (remote, session) = setup(FakeRemote::new());
        let form = AddTodoForm::new(remote.clone(), session.clone());

        let record = form.submit("0xabc", 2.0).await.unwrap();

        assert_eq!(record, TodoRecord::new("0xabc", 2.0).with_id("t1"));
        assert_eq!(session.records(), vec![record]);
        assert_eq!(session.notification(), Some(Notification::success(ADDED)));
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn add_empty_text_makes_no_remote_call() {
        let (remote, session) = setup(FakeRemote::new());
        let form = AddTodoForm::new(remote.clone(), session.clone());

        let err = form.submit("   ", 2.0).await.unwrap_err();

        assert!(matches!(err, TodoError::Validation(ValidationError::EmptyText)));
        assert!(remote.calls().is_empty());
        assert!(session.records().is_empty());
        assert_eq!(
            session.notification(),
            Some(Notification::error("Task text cannot be empty"))
        );
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn add_non_positive_value_is_rejected() {
        let (remote, session) = setup(FakeRemote::new());
        let form = AddTodoForm::new(remote.clone(), session.clone());

        for value in [0.0, -1.0, f64::NAN] {
            let err = form.submit("0xabc", value).await.unwrap_err();
            assert!(matches!(err, TodoError::Validation(ValidationError::NonPositiveValue)));
        }
        assert!(remote.calls().is_empty());
        assert_eq!(
            session.notification(),
            Some(Notification::error("Value must be positive"))
        );
    }

    #[tokio::test]
    async fn add_remote_error_surfaces_message_and_keeps_records() {
        let (remote, session) = setup(FakeRemote::new());
        remote.fail_next(Op::Create, "API credits exhausted");
        let form = AddTodoForm::new(remote.clone(), session.clone());

        let err = form.submit("0xabc", 2.0).await.unwrap_err();

        assert!(matches!(err, TodoError::Remote(ApiError::Remote(_))));
        assert!(session.records().is_empty());
        assert_eq!(
            session.notification(),
            Some(Notification::error("API credits exhausted"))
        );
    }

    #[tokio::test]
    async fn add_transport_error_uses_fallback() {
        let (remote, session) = setup(FakeRemote::new());
        remote.fail_transport(Op::Create);
        let form = AddTodoForm::new(remote, session.clone());

        form.submit("0xabc", 2.0).await.unwrap_err();

        assert_eq!(session.notification(), Some(Notification::error(CREATE_FAILED)));
    }

    #[tokio::test(start_paused = true)]
    async fn add_rejects_second_submit_while_in_flight() {
        let (remote, session) = setup(FakeRemote::new().with_latency("0xabc", Duration::from_millis(50)));
        let form = AddTodoForm::new(remote.clone(), session.clone());

        let (first, second) = tokio::join!(form.submit("0xabc", 2.0), async {
            tokio::task::yield_now().await;
            assert!(form.is_loading());
            form.submit("0xabc", 2.0).await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(TodoError::Busy)));
        assert_eq!(remote.calls().len(), 1);
        assert_eq!(session.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submit_applies_nothing_and_reenables() {
        let (remote, session) = setup(FakeRemote::new().with_latency("0xabc", Duration::from_millis(50)));
        let form = AddTodoForm::new(remote, session.clone());

        let outcome = tokio::time::timeout(Duration::from_millis(10), form.submit("0xabc", 2.0)).await;

        assert!(outcome.is_err());
        assert!(!form.is_loading());
        assert!(session.records().is_empty());
        assert!(session.notification().is_none());
    }

    // --- fetch ---

    #[tokio::test]
    async fn fetch_unknown_key_appends_response() {
        let (remote, session) = setup(FakeRemote::new().with_record(TodoRecord::new("0xdef", 5.0)));
        let form = FetchTodoForm::new(remote, session.clone());

        form.submit("0xdef").await.unwrap();

        assert_eq!(session.records(), vec![TodoRecord::new("0xdef", 5.0)]);
        assert_eq!(session.notification(), Some(Notification::success(FETCHED)));
    }

    #[tokio::test]
    async fn fetch_known_key_replaces_in_place() {
        let (remote, session) = setup(FakeRemote::new().with_record(TodoRecord::new("b", 7.0)));
        session.created(TodoRecord::new("a", 1.0));
        session.created(TodoRecord::new("b", 2.0));
        session.created(TodoRecord::new("c", 3.0));
        let form = FetchTodoForm::new(remote, session.clone());

        form.submit("b").await.unwrap();

        let records = session.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], TodoRecord::new("b", 7.0));
    }

    #[tokio::test]
    async fn fetch_empty_key_is_rejected() {
        let (remote, session) = setup(FakeRemote::new());
        let form = FetchTodoForm::new(remote.clone(), session.clone());

        form.submit(" ").await.unwrap_err();

        assert!(remote.calls().is_empty());
        assert_eq!(
            session.notification(),
            Some(Notification::error("Todo Txhash cannot be empty"))
        );
    }

    #[tokio::test]
    async fn fetch_error_body_is_shown_verbatim() {
        let (remote, session) = setup(FakeRemote::new());
        let form = FetchTodoForm::new(remote, session.clone());

        form.submit("0xmissing").await.unwrap_err();

        assert!(session.records().is_empty());
        assert_eq!(session.notification(), Some(Notification::error("Todo not found")));
    }

    #[tokio::test]
    async fn fetch_transport_error_is_generic() {
        let (remote, session) = setup(FakeRemote::new());
        remote.fail_transport(Op::Get);
        let form = FetchTodoForm::new(remote, session.clone());

        form.submit("0xdef").await.unwrap_err();

        assert_eq!(session.notification(), Some(Notification::error(FETCH_UNREACHABLE)));
    }

    // --- edit in place ---

    fn seeded(key: &str, value: f64) -> (Arc<FakeRemote>, SessionHandle, TodoItem<FakeRemote>) {
        let (remote, session) = setup(FakeRemote::new().with_record(TodoRecord::new(key, value)));
        session.created(TodoRecord::new(key, value));
        let item = TodoItem::new(key, remote.clone(), session.clone());
        (remote, session, item)
    }

    #[tokio::test]
    async fn save_updates_value_and_leaves_edit_mode() {
        let (remote, session, item) = seeded("0xabc", 2.0);
        item.begin_edit().unwrap();
        assert_eq!(item.mode(), ItemMode::Editing { draft: 2.0 });
        item.set_draft(10.0);

        item.save().await.unwrap();

        assert_eq!(item.mode(), ItemMode::Display);
        assert_eq!(session.records(), vec![TodoRecord::new("0xabc", 10.0)]);
        assert_eq!(session.notification(), Some(Notification::success(UPDATED)));
        assert_eq!(
            remote.calls(),
            vec![Call::Update("0xabc".into(), UpdateTodo { value: 10.0 })]
        );
    }

    #[tokio::test]
    async fn save_failure_stays_in_edit_mode() {
        let (remote, session, item) = seeded("0xabc", 2.0);
        remote.fail_next(Op::Update, "Update rejected");
        item.begin_edit().unwrap();
        item.set_draft(10.0);

        item.save().await.unwrap_err();

        assert_eq!(item.mode(), ItemMode::Editing { draft: 10.0 });
        assert_eq!(session.records(), vec![TodoRecord::new("0xabc", 2.0)]);
        assert_eq!(session.notification(), Some(Notification::error("Update rejected")));
    }

    #[tokio::test]
    async fn save_invalid_draft_is_rejected_locally() {
        let (remote, session, item) = seeded("0xabc", 2.0);
        item.begin_edit().unwrap();
        item.set_draft(0.0);

        item.save().await.unwrap_err();

        assert!(item.is_editing());
        assert!(remote.calls().is_empty());
        assert_eq!(
            session.notification(),
            Some(Notification::error(
                "Task text cannot be empty and value must be positive"
            ))
        );
    }

    #[tokio::test]
    async fn save_after_record_vanished_reports_unknown_key() {
        let (_remote, session, item) = seeded("0xabc", 2.0);
        item.begin_edit().unwrap();
        session.deleted("0xabc");

        let err = item.save().await.unwrap_err();

        assert!(matches!(err, TodoError::UnknownKey(_)));
        assert!(session.records().is_empty());
        assert_eq!(session.notification().map(|n| n.severity), Some(Severity::Error));
    }

    #[tokio::test]
    async fn cancel_edit_discards_draft() {
        let (remote, session, item) = seeded("0xabc", 2.0);
        item.begin_edit().unwrap();
        item.set_draft(99.0);
        item.cancel_edit().unwrap();

        assert_eq!(item.mode(), ItemMode::Display);
        assert_eq!(session.records()[0].value, 2.0);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_success_removes_record() {
        let (_remote, session, item) = seeded("0xabc", 2.0);

        item.delete().await.unwrap();

        assert!(session.records().is_empty());
        assert_eq!(session.notification(), Some(Notification::success(DELETED)));
    }

    #[tokio::test]
    async fn delete_failure_keeps_record() {
        let (remote, session, item) = seeded("0xabc", 2.0);
        remote.fail_next(Op::Delete, "Delete rejected");

        item.delete().await.unwrap_err();

        assert_eq!(session.records().len(), 1);
        assert_eq!(session.notification(), Some(Notification::error("Delete rejected")));
    }

    // --- concurrency ---

    #[tokio::test(start_paused = true)]
    async fn concurrent_controls_apply_in_settle_order() {
        let remote = FakeRemote::new()
            .with_record(TodoRecord::new("0xdef", 5.0))
            .with_latency("0xabc", Duration::from_millis(200))
            .with_latency("0xdef", Duration::from_millis(50));
        let (remote, session) = setup(remote);
        let add = AddTodoForm::new(remote.clone(), session.clone());
        let fetch = FetchTodoForm::new(remote.clone(), session.clone());

        let (added, fetched) = tokio::join!(add.submit("0xabc", 2.0), fetch.submit("0xdef"));
        added.unwrap();
        fetched.unwrap();

        let keys: Vec<_> = session.records().into_iter().map(|r| r.key).collect();
        assert_eq!(keys, ["0xdef", "0xabc"]);
        assert_eq!(session.notification(), Some(Notification::success(ADDED)));
    }

    #[tokio::test(start_paused = true)]
    async fn racing_creates_for_one_key_both_append() {
        let remote = FakeRemote::new().with_latency("dup", Duration::from_millis(10));
        let (remote, session) = setup(remote);
        let first = AddTodoForm::new(remote.clone(), session.clone());
        let second = AddTodoForm::new(remote.clone(), session.clone());

        let (a, b) = tokio::join!(first.submit("dup", 1.0), second.submit("dup", 1.0));
        a.unwrap();
        b.unwrap();

        assert_eq!(session.records().len(), 2);
    }
}
