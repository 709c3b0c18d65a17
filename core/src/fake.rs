//! In-memory `RemoteTodoClient` for tests.
//!
//! Records every call, can be scripted to fail the next call of a given
//! operation, and can delay responses per key so tests control the order in
//! which concurrent calls settle (run them under paused tokio time).

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::ApiError;
use crate::remote::RemoteTodoClient;
use crate::types::{CreateTodo, Created, TodoRecord, UpdateTodo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Get,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(CreateTodo),
    Get(String),
    Update(String, UpdateTodo),
    Delete(String),
}

#[derive(Debug, Clone)]
enum Scripted {
    Remote(String),
    Transport,
}

#[derive(Default)]
struct FakeState {
    records: HashMap<String, TodoRecord>,
    next_id: u64,
    calls: Vec<Call>,
    failures: HashMap<Op, VecDeque<Scripted>>,
    latency: HashMap<String, Duration>,
}

#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a record the service already holds.
    pub fn with_record(self, record: TodoRecord) -> Self {
        self.lock().records.insert(record.key.clone(), record);
        self
    }

    /// Delay every call that addresses `key`.
    pub fn with_latency(self, key: &str, delay: Duration) -> Self {
        self.lock().latency.insert(key.to_string(), delay);
        self
    }

    /// Make the next `op` call answer with an `{"error"}` body.
    pub fn fail_next(&self, op: Op, message: &str) {
        self.lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(Scripted::Remote(message.to_string()));
    }

    /// Make the next `op` call fail before reaching the service.
    pub fn fail_transport(&self, op: Op) {
        self.lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(Scripted::Transport);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn stored(&self, key: &str) -> Option<TodoRecord> {
        self.lock().records.get(key).cloned()
    }

    /// Log the call, then wait out any latency configured for `key`.
    async fn enter(&self, call: Call, op: Op, key: &str) -> Result<(), ApiError> {
        let (delay, failure) = {
            let mut state = self.lock();
            state.calls.push(call);
            let failure = state.failures.get_mut(&op).and_then(VecDeque::pop_front);
            (state.latency.get(key).copied(), failure)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(Scripted::Remote(message)) => Err(ApiError::Remote(message)),
            Some(Scripted::Transport) => Err(ApiError::Transport("connection reset".into())),
            None => Ok(()),
        }
    }
}

impl RemoteTodoClient for FakeRemote {
    async fn create(&self, payload: CreateTodo) -> Result<Created, ApiError> {
        let key = payload.key.clone();
        self.enter(Call::Create(payload.clone()), Op::Create, &key).await?;
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("t{}", state.next_id);
        state
            .records
            .insert(key.clone(), TodoRecord::new(key, payload.value).with_id(id.clone()));
        Ok(Created { id })
    }

    async fn get(&self, key: &str) -> Result<TodoRecord, ApiError> {
        self.enter(Call::Get(key.to_string()), Op::Get, key).await?;
        self.lock()
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| ApiError::Remote("Todo not found".into()))
    }

    async fn update(&self, key: &str, patch: UpdateTodo) -> Result<(), ApiError> {
        self.enter(Call::Update(key.to_string(), patch), Op::Update, key).await?;
        let mut state = self.lock();
        let record = state
            .records
            .get_mut(key)
            .ok_or_else(|| ApiError::Remote("Todo not found".into()))?;
        record.value = patch.value;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        self.enter(Call::Delete(key.to_string()), Op::Delete, key).await?;
        self.lock()
            .records
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ApiError::Remote("Todo not found".into()))
    }
}
