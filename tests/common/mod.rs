//! Shared test infrastructure for TodoStore integration tests.

#![allow(dead_code)]

use tempfile::TempDir;
use todostore::{FileKv, MemoryKv, NewTodo, Priority, SqliteKv, Todo, TodoStore};

/// Medium priority, empty content, no due date.
pub fn medium(title: &str) -> NewTodo {
    NewTodo::new(title).content("").priority(Priority::Medium)
}

/// Test environment holding a memory-backed store and its slot.
pub struct TestEnv {
    pub kv: MemoryKv,
    pub store: TodoStore<MemoryKv>,
}

impl TestEnv {
    pub fn new() -> Self {
        let kv = MemoryKv::new();
        let store = TodoStore::open(kv.clone()).expect("Failed to open store");
        Self { kv, store }
    }

    /// Add a medium-priority todo and return its id.
    pub fn add(&mut self, title: &str) -> i64 {
        self.store.add_new_todo(medium(title)).expect("Failed to add todo")
    }

    /// Open a second store on the same slot.
    pub fn reopen(&self) -> TodoStore<MemoryKv> {
        TodoStore::open(self.kv.clone()).expect("Failed to reopen store")
    }

    /// Assert that the slot holds exactly the live collection.
    pub fn assert_synced(&self) {
        assert_eq!(self.reopen().todos(), self.store.todos());
    }

    pub fn titles(&self) -> Vec<String> {
        self.store.todos().iter().map(|t| t.title.clone()).collect()
    }
}

/// On-disk environment for the SQLite and file backends.
pub struct DiskEnv {
    pub temp_dir: TempDir,
}

impl DiskEnv {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn sqlite(&self) -> TodoStore<SqliteKv> {
        TodoStore::open(SqliteKv::open(self.temp_dir.path()).expect("Failed to open sqlite")).expect("Failed to open store")
    }

    pub fn file(&self) -> TodoStore<FileKv> {
        TodoStore::open(FileKv::open(self.temp_dir.path()).expect("Failed to open dir")).expect("Failed to open store")
    }
}

pub fn find(todos: &[Todo], id: i64) -> &Todo {
    todos
        .iter()
        .find(|t| t.id == id)
        .unwrap_or_else(|| panic!("todo {} not found", id))
}
