// TodoStore - in-memory todo collection with durable key-value persistence

pub mod config;
pub mod file;
pub mod id;
pub mod kv;
pub mod shared;
pub mod sqlite;
pub mod store;
pub mod todo;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use file::FileKv;
pub use id::{IdSource, now_ms};
pub use kv::{KvStore, MemoryKv};
pub use shared::SharedTodoStore;
pub use sqlite::SqliteKv;
pub use store::{STORAGE_KEY, TodoStore};
pub use todo::{NewTodo, Priority, Todo, TodoPatch};
