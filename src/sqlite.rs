// SQLite-backed key-value slots

use crate::id::now_ms;
use crate::kv::KvStore;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CURRENT_VERSION: u32 = 1;
const DB_FILE: &str = "todostore.db";

/// Slot store holding one row per key in a single SQLite table
pub struct SqliteKv {
    base_path: PathBuf,
    db: Connection,
}

impl SqliteKv {
    /// Open or create a slot database in the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let db_path = base_path.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let kv = Self { base_path, db };
        kv.create_schema()?;
        kv.create_gitignore()?;
        kv.write_version()?;

        Ok(kv)
    }

    /// Get the directory holding the database
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "todostore.db\ntodostore.db-shm\ntodostore.db-wal\n")?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .context("Failed to read slot from SQLite")?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let tx = self.db.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now_ms()],
        )
        .context("Failed to write slot to SQLite")?;

        tx.commit()?;
        debug!(key, bytes = value.len(), "sqlite slot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data");

        let kv = SqliteKv::open(&dir).unwrap();
        assert_eq!(kv.base_path(), dir.as_path());
        assert!(dir.join(DB_FILE).exists());
        assert!(dir.join(".gitignore").exists());
        assert_eq!(fs::read_to_string(dir.join(".version")).unwrap(), "1");
    }

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let kv = SqliteKv::open(temp.path()).unwrap();
        assert!(kv.get("nothing").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites_and_survives_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut kv = SqliteKv::open(temp.path()).unwrap();
            kv.set("todos", "[]").unwrap();
            kv.set("todos", "[1]").unwrap();
        }

        let kv = SqliteKv::open(temp.path()).unwrap();
        assert_eq!(kv.get("todos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_keys_are_independent() {
        let temp = TempDir::new().unwrap();
        let mut kv = SqliteKv::open(temp.path()).unwrap();
        kv.set("a", "1").unwrap();
        kv.set("b", "2").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(kv.get("b").unwrap().as_deref(), Some("2"));
    }
}
