// Thread-safe handle around a TodoStore

use crate::kv::KvStore;
use crate::store::TodoStore;
use crate::todo::{NewTodo, Todo, TodoPatch};
use eyre::{Result, eyre};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle for callers on several threads
///
/// Each operation holds one lock across read, compute, write and sync, so ids
/// stay unique and the slot always matches the last completed mutation.
pub struct SharedTodoStore<K: KvStore> {
    inner: Arc<Mutex<TodoStore<K>>>,
}

impl<K: KvStore> Clone for SharedTodoStore<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: KvStore> SharedTodoStore<K> {
    pub fn new(store: TodoStore<K>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TodoStore<K>>> {
        self.inner.lock().map_err(|_| eyre!("Todo store lock poisoned"))
    }

    pub fn add_new_todo(&self, data: NewTodo) -> Result<i64> {
        self.lock()?.add_new_todo(data)
    }

    pub fn delete_todo(&self, id: i64) -> Result<()> {
        self.lock()?.delete_todo(id)
    }

    pub fn toggle_complete(&self, id: i64) -> Result<()> {
        self.lock()?.toggle_complete(id)
    }

    pub fn edit_todo(&self, id: i64, updates: TodoPatch) -> Result<()> {
        self.lock()?.edit_todo(id, updates)
    }

    /// Copy of the current collection, newest first
    pub fn snapshot(&self) -> Result<Vec<Todo>> {
        Ok(self.lock()?.todos().to_vec())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn subscribe<F>(&self, listener: F) -> Result<()>
    where
        F: FnMut(&[Todo]) + Send + 'static,
    {
        self.lock()?.subscribe(listener);
        Ok(())
    }
}
