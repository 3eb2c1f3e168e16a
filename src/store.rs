// Todo store: in-memory collection persisted to a key-value slot

use crate::id::IdSource;
use crate::kv::KvStore;
use crate::todo::{NewTodo, Todo, TodoPatch};
use eyre::{Context, Result, eyre};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Slot key the collection lives under unless another is chosen
pub const STORAGE_KEY: &str = "krafton-todos-vue";

type Listener = Box<dyn FnMut(&[Todo]) + Send>;

/// Ordered todo collection, newest first, mirrored into a durable slot
///
/// Every mutation goes through [`TodoStore::commit`], which writes the whole
/// next collection to the slot and only then makes it visible. A failed write
/// leaves both memory and the slot at the previous state.
pub struct TodoStore<K: KvStore> {
    backend: K,
    key: String,
    todos: Vec<Todo>,
    ids: IdSource,
    listeners: Vec<Listener>,
}

impl<K: KvStore> TodoStore<K> {
    /// Open the store against `backend` using [`STORAGE_KEY`]
    pub fn open(backend: K) -> Result<Self> {
        Self::open_with_key(backend, STORAGE_KEY)
    }

    /// Open the store against `backend` using a custom slot key
    ///
    /// A missing slot starts an empty collection. A slot whose value does not
    /// parse as a collection is an error; the slot is left untouched.
    pub fn open_with_key(backend: K, key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        let todos = match backend.get(&key)? {
            Some(raw) => Self::parse(&key, &raw)?,
            None => {
                debug!(key = %key, "No stored todos, starting empty");
                Vec::new()
            }
        };

        let floor = todos.iter().map(|t| t.id).max().unwrap_or(0);
        info!(key = %key, count = todos.len(), "Opened todo store");

        Ok(Self {
            backend,
            key,
            todos,
            ids: IdSource::new(floor),
            listeners: Vec::new(),
        })
    }

    fn parse(key: &str, raw: &str) -> Result<Vec<Todo>> {
        let todos: Vec<Todo> = serde_json::from_str(raw)
            .wrap_err_with(|| format!("Failed to parse stored todos under key {}", key))?;

        let mut seen = HashSet::new();
        for todo in &todos {
            if !seen.insert(todo.id) {
                return Err(eyre!("Stored todos under key {} contain duplicate id {}", key, todo.id));
            }
        }

        Ok(todos)
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    /// The collection, newest first
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: i64) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Give back the slot backend, e.g. to reopen a fresh store on it
    pub fn into_backend(self) -> K {
        self.backend
    }

    /// Register a callback run after every successful mutation
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&[Todo]) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Prepend a new, incomplete record built from `data`; returns its id
    pub fn add_new_todo(&mut self, data: NewTodo) -> Result<i64> {
        // The id is only claimed once the write has gone through
        let mut ids = self.ids.clone();
        let id = ids.next_id()?;

        let mut next = Vec::with_capacity(self.todos.len() + 1);
        next.push(data.into_todo(id));
        next.extend(self.todos.iter().cloned());

        self.commit("add", next)?;
        self.ids = ids;
        Ok(id)
    }

    /// Remove every record with `id`; unknown ids leave the collection as is
    pub fn delete_todo(&mut self, id: i64) -> Result<()> {
        let next = self.todos.iter().filter(|t| t.id != id).cloned().collect();
        self.commit("delete", next)
    }

    /// Flip `completed` on the record with `id`
    pub fn toggle_complete(&mut self, id: i64) -> Result<()> {
        let next = self
            .todos
            .iter()
            .map(|t| {
                if t.id == id {
                    Todo {
                        completed: !t.completed,
                        ..t.clone()
                    }
                } else {
                    t.clone()
                }
            })
            .collect();
        self.commit("toggle", next)
    }

    /// Merge `updates` into the record with `id`
    pub fn edit_todo(&mut self, id: i64, updates: TodoPatch) -> Result<()> {
        let next = self
            .todos
            .iter()
            .map(|t| if t.id == id { updates.apply(t) } else { t.clone() })
            .collect();
        self.commit("edit", next)
    }

    /// Persist `next` to the slot, then swap it in and notify listeners
    fn commit(&mut self, op: &str, next: Vec<Todo>) -> Result<()> {
        let json = serde_json::to_string(&next).context("Failed to serialize todos")?;

        if let Err(e) = self.backend.set(&self.key, &json) {
            warn!(op, key = %self.key, error = %e, "Persist failed, change rolled back");
            return Err(e.wrap_err(format!("Failed to persist todos after {}", op)));
        }

        self.todos = next;
        debug!(op, key = %self.key, count = self.todos.len(), bytes = json.len(), "Todos persisted");

        for listener in self.listeners.iter_mut() {
            listener(&self.todos);
        }

        Ok(())
    }
}
