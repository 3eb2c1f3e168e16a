// Configuration for the bootstrap binary and embedding applications

use crate::file::FileKv;
use crate::kv::{KvStore, MemoryKv};
use crate::sqlite::SqliteKv;
use crate::store::{STORAGE_KEY, TodoStore};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the data directory
pub const DIR_ENV: &str = "TODOSTORE_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub dir: PathBuf,
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            dir: default_dir(),
            key: STORAGE_KEY.to_string(),
        }
    }
}

fn default_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("todostore"))
        .unwrap_or_else(|| PathBuf::from(".todostore"))
}

/// Default config file location: `<config dir>/todostore/config.yml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("todostore").join("config.yml"))
}

impl Config {
    /// Load config from `path`, or the default location, or built-in defaults
    ///
    /// An explicit path must exist. `TODOSTORE_DIR` overrides `dir` in all cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(dir) = std::env::var(DIR_ENV) {
            debug!(dir = %dir, "Data directory overridden from environment");
            config.dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content).wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.key.trim().is_empty() {
            return Err(eyre!("Config key cannot be empty"));
        }
        Ok(config)
    }

    /// Open the configured slot backend
    pub fn open_backend(&self) -> Result<Box<dyn KvStore>> {
        let backend: Box<dyn KvStore> = match self.backend {
            Backend::Sqlite => Box::new(SqliteKv::open(&self.dir)?),
            Backend::File => Box::new(FileKv::open(&self.dir)?),
            Backend::Memory => Box::new(MemoryKv::new()),
        };
        Ok(backend)
    }

    /// Open a store on the configured backend and key
    pub fn open_store(&self) -> Result<TodoStore<Box<dyn KvStore>>> {
        TodoStore::open_with_key(self.open_backend()?, self.key.clone())
    }
}
