// Durable key-value slot abstraction

use eyre::{Result, eyre};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A key-value blob store the todo collection is persisted into
///
/// `set` overwrites the whole value for `key`. Implementations must have
/// finished (or failed) the write by the time `set` returns.
pub trait KvStore: Send {
    /// Read the value stored under `key`, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    fail_writes: bool,
}

/// Process-local slot store
///
/// Clones share the same underlying map, so a second store can be opened
/// against the data the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `set` fail, as a full or unavailable storage would
    pub fn set_fail_writes(&self, fail: bool) -> Result<()> {
        self.lock()?.fail_writes = fail;
        Ok(())
    }

    /// Store a raw value directly, bypassing any store
    pub fn insert_raw(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Peek at the raw value under `key`
    pub fn raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner.lock().map_err(|_| eyre!("Memory slot store lock poisoned"))
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.raw(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.fail_writes {
            return Err(eyre!("Storage quota exceeded writing key {}", key));
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
