//! Shared handle over the session store and its notification timer.
//!
//! # Design
//! Every notification raised through the handle arms the timer and schedules
//! an expiry task on the current tokio runtime. The task holds only a weak
//! reference, so a dropped session takes its pending timers with it. The
//! mutex is never held across an `.await`; controllers lock it once a remote
//! call has settled, so completions apply in the order they settle.
//!
//! Without a runtime (plain unit tests) no expiry is scheduled and
//! notifications stay until dismissed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::config::NotificationSettings;
use crate::error::TodoError;
use crate::store::{Notification, SessionStore};
use crate::timer::{NotificationTimer, TimerState};
use crate::types::{TodoRecord, UpdateTodo};

#[derive(Debug, Default)]
struct SessionInner {
    store: SessionStore,
    timer: NotificationTimer,
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub records: Vec<TodoRecord>,
    pub notification: Option<Notification>,
    pub loading: bool,
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionInner>>,
    settings: NotificationSettings,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new(NotificationSettings::default())
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionHandle {
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner::default())),
            settings,
        }
    }

    pub fn settings(&self) -> NotificationSettings {
        self.settings
    }

    pub fn created(&self, record: TodoRecord) {
        self.mutate(|store| store.apply_create(record));
    }

    pub fn fetched(&self, record: TodoRecord) {
        self.mutate(|store| store.apply_fetch(record));
    }

    pub fn updated(&self, key: &str, patch: UpdateTodo) -> Result<(), TodoError> {
        self.mutate(|store| store.apply_update(key, patch))
    }

    pub fn deleted(&self, key: &str) {
        self.mutate(|store| store.apply_delete(key));
    }

    /// Raise an error notification. Records are left as they are.
    pub fn failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate(|store| store.report_error(message));
    }

    pub fn notify(&self, notification: Notification) {
        self.mutate(|store| store.notify(notification));
    }

    pub fn finish_loading(&self) {
        lock(&self.inner).store.finish_loading();
    }

    /// Manual dismissal: the timer stops now, the notification goes after
    /// the fade delay unless a newer one has replaced it.
    pub fn dismiss(&self) {
        let mut inner = lock(&self.inner);
        if inner.store.notification().is_none() {
            return;
        }
        inner.timer.disarm();
        let generation = inner.timer.generation();
        let fade = self.settings.fade;

        if fade.is_zero() {
            inner.store.dismiss();
            return;
        }
        match self.schedule(fade, move |inner| {
            if inner.timer.generation() == generation {
                inner.store.dismiss();
            }
        }) {
            Some(handle) => inner.timer.track(handle),
            None => inner.store.dismiss(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = lock(&self.inner);
        SessionSnapshot {
            records: inner.store.records().to_vec(),
            notification: inner.store.notification().cloned(),
            loading: inner.store.is_loading(),
        }
    }

    pub fn records(&self) -> Vec<TodoRecord> {
        lock(&self.inner).store.records().to_vec()
    }

    pub fn record(&self, key: &str) -> Option<TodoRecord> {
        lock(&self.inner).store.get(key).cloned()
    }

    pub fn notification(&self) -> Option<Notification> {
        lock(&self.inner).store.notification().cloned()
    }

    pub fn timer_state(&self) -> TimerState {
        lock(&self.inner).timer.state()
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut SessionStore) -> R) -> R {
        let mut inner = lock(&self.inner);
        let result = apply(&mut inner.store);
        self.arm(&mut inner);
        result
    }

    fn arm(&self, inner: &mut SessionInner) {
        let duration = self.settings.duration;
        let generation = inner.timer.arm(Instant::now(), duration);
        let handle = self.schedule(duration, move |inner| {
            if inner.timer.expire(generation) {
                tracing::debug!(generation, "notification expired");
                inner.store.dismiss();
            }
        });
        if let Some(handle) = handle {
            inner.timer.track(handle);
        }
    }

    /// Run `fire` against the session after `delay`, if a runtime is present.
    fn schedule(
        &self,
        delay: Duration,
        fire: impl FnOnce(&mut SessionInner) + Send + 'static,
    ) -> Option<tokio::task::AbortHandle> {
        let runtime = Handle::try_current().ok()?;
        let weak: Weak<Mutex<SessionInner>> = Arc::downgrade(&self.inner);
        let deadline = Instant::now() + delay;
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                fire(&mut lock(&inner));
            }
        });
        Some(task.abort_handle())
    }
}
