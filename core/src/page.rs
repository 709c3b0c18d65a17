//! Whole-page state: either a working todo page or a terminal init failure.
//!
//! The remote client is built once at startup and shared by every control on
//! the page. If it cannot be built, the page is `Failed` and no control
//! exists to be used.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{ClientConfig, NotificationSettings};
use crate::error::ConfigError;
use crate::forms::{AddTodoForm, FetchTodoForm, ItemMode, TodoItem};
use crate::remote::{HttpRemote, RemoteTodoClient};
use crate::session::SessionHandle;
use crate::store::Notification;
use crate::types::TodoRecord;

pub enum Page<C> {
    Ready(TodoPage<C>),
    Failed(ConfigError),
}

impl<C: RemoteTodoClient> Page<C> {
    /// Start the page from the outcome of client initialization.
    pub fn start(client: Result<C, ConfigError>, settings: NotificationSettings) -> Self {
        match client {
            Ok(client) => Page::Ready(TodoPage::new(Arc::new(client), settings)),
            Err(err) => {
                tracing::error!(error = %err, "failed to initialize");
                Page::Failed(err)
            }
        }
    }

    pub fn ready(&self) -> Option<&TodoPage<C>> {
        match self {
            Page::Ready(page) => Some(page),
            Page::Failed(_) => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut TodoPage<C>> {
        match self {
            Page::Ready(page) => Some(page),
            Page::Failed(_) => None,
        }
    }

    pub fn view(&self) -> PageView {
        match self {
            Page::Ready(page) => page.view(),
            Page::Failed(err) => PageView::Failed {
                message: err.to_string(),
            },
        }
    }
}

impl Page<HttpRemote> {
    /// Resolve configuration and connect the HTTP client.
    pub fn connect(config: Result<ClientConfig, ConfigError>, settings: NotificationSettings) -> Self {
        let client = config.and_then(|config| HttpRemote::connect(&config));
        Self::start(client, settings)
    }
}

pub struct TodoPage<C> {
    remote: Arc<C>,
    session: SessionHandle,
    add: AddTodoForm<C>,
    fetch: FetchTodoForm<C>,
    items: Vec<Arc<TodoItem<C>>>,
}

impl<C: RemoteTodoClient> TodoPage<C> {
    pub fn new(remote: Arc<C>, settings: NotificationSettings) -> Self {
        let session = SessionHandle::new(settings);
        let add = AddTodoForm::new(remote.clone(), session.clone());
        let fetch = FetchTodoForm::new(remote.clone(), session.clone());
        session.finish_loading();
        Self {
            remote,
            session,
            add,
            fetch,
            items: Vec::new(),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn add_form(&self) -> &AddTodoForm<C> {
        &self.add
    }

    pub fn fetch_form(&self) -> &FetchTodoForm<C> {
        &self.fetch
    }

    /// Line the item controllers up with the session's records.
    ///
    /// Items are matched by key, so a record that stays keeps its edit
    /// state; items whose record is gone are dropped.
    pub fn reconcile(&mut self) {
        let mut previous = std::mem::take(&mut self.items);
        for record in self.session.records() {
            let item = match previous.iter().position(|item| item.key() == record.key) {
                Some(index) => previous.swap_remove(index),
                None => Arc::new(TodoItem::new(
                    record.key,
                    self.remote.clone(),
                    self.session.clone(),
                )),
            };
            self.items.push(item);
        }
    }

    pub fn items(&mut self) -> &[Arc<TodoItem<C>>] {
        self.reconcile();
        &self.items
    }

    pub fn item(&mut self, key: &str) -> Option<Arc<TodoItem<C>>> {
        self.reconcile();
        self.items.iter().find(|item| item.key() == key).cloned()
    }

    pub fn view(&self) -> PageView {
        let snapshot = self.session.snapshot();
        let records = snapshot
            .records
            .into_iter()
            .map(|record| {
                let item = self.items.iter().find(|item| item.key() == record.key);
                ItemView {
                    draft: item.and_then(|item| match item.mode() {
                        ItemMode::Editing { draft } => Some(draft),
                        ItemMode::Display => None,
                    }),
                    loading: item.is_some_and(|item| item.is_loading()),
                    record,
                }
            })
            .collect();
        PageView::Ready {
            records,
            notification: snapshot.notification,
            loading: snapshot.loading,
            adding: self.add.is_loading(),
            fetching: self.fetch.is_loading(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub record: TodoRecord,
    /// Draft value while the item is in edit mode.
    pub draft: Option<f64>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PageView {
    Failed {
        message: String,
    },
    Ready {
        records: Vec<ItemView>,
        notification: Option<Notification>,
        loading: bool,
        adding: bool,
        fetching: bool,
    },
}
