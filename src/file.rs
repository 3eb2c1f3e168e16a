// File-backed key-value slots

use crate::kv::KvStore;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Slot store keeping each key in its own `<key>.json` file
///
/// Writes go to a temp file that is synced and renamed over the target while
/// holding an exclusive lock on `<key>.json.lock`, so readers never see a
/// half-written value.
#[derive(Debug, Clone)]
pub struct FileKv {
    base_path: PathBuf,
}

impl FileKv {
    /// Open or create a slot directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file holding `key`
    pub fn slot_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(eyre!("Slot key cannot be empty"));
        }
        if key.len() > 64 {
            return Err(eyre!("Slot key too long: {} (max 64 chars)", key));
        }
        if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid slot key: {} (must be alphanumeric with _/-)", key));
        }
        Ok(())
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).wrap_err_with(|| format!("Failed to read slot file {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        let lock_path = path.with_extension("json.lock");
        let tmp_path = path.with_extension("json.tmp");

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .context("Failed to open slot lock file")?;

        // Acquire exclusive lock before writing
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut file = File::create(&tmp_path).context("Failed to create temp slot file")?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &path).context("Failed to replace slot file")?;
        debug!(key, bytes = value.len(), "file slot written");

        // Lock is automatically released when file is dropped
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let kv = FileKv::open(temp.path()).unwrap();
        assert!(kv.get("todos").unwrap().is_none());
    }

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();

        kv.set("todos", "[]").unwrap();
        kv.set("todos", "[{\"id\":1}]").unwrap();

        assert_eq!(kv.get("todos").unwrap().as_deref(), Some("[{\"id\":1}]"));
        assert!(temp.path().join("todos.json").exists());
        assert!(!temp.path().join("todos.json.tmp").exists());
    }

    #[test]
    fn test_key_validation() {
        assert!(FileKv::validate_key("krafton-todos-vue").is_ok());
        assert!(FileKv::validate_key("valid_key").is_ok());

        assert!(FileKv::validate_key("").is_err());
        assert!(FileKv::validate_key("../escape").is_err());
        assert!(FileKv::validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_invalid_key_rejected_on_set() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();
        assert!(kv.set("a/b", "x").is_err());
    }
}
