//! Opaque string key-value storage for saved settings.

use crate::log_warn;
use crate::shared::errors::{AppError, AppResult};
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

/// All keys in one JSON object file
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents, or `None` when nothing has been saved yet
    fn read_raw(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_all(&self) -> AppResult<Map<String, Value>> {
        match self.read_raw()? {
            Some(raw) => self.parse(&raw),
            None => Ok(Map::new()),
        }
    }

    fn parse(&self, raw: &str) -> AppResult<Map<String, Value>> {
        match serde_json::from_str(raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::StorageError(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.read_all()?.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    /// A corrupt file is replaced rather than blocking every later save;
    /// a file that cannot be read is left alone
    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut map = match self.read_raw()? {
            Some(raw) => self.parse(&raw).unwrap_or_else(|e| {
                log_warn!("Replacing unreadable settings in {}: {}", self.path.display(), e);
                Map::new()
            }),
            None => Map::new(),
        };
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(map))?)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    values: DashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
