use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tabula_core::write_atomic;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize setting '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 以 JSON 檔保存的鍵值設定。 / Key/value settings persisted as a single JSON object.
///
/// Keys use `Group/Name` form, e.g. `Application/ShowPath`.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
}

impl SettingsStore {
    /// 不落地的設定，供測試使用。 / A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 從檔案載入；檔案不存在時回傳空設定。 / Loads from disk, yielding an empty store when the file is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path: Some(path),
                values: BTreeMap::new(),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let values = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// 建立指向 `path` 的空設定（例如原檔毀損時）。 / An empty store bound to `path`, e.g. after a corrupt file.
    pub fn empty_at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            values: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 讀取設定；缺少或型別不符時回傳預設值。 / Reads a value, falling back to `default` when missing or mistyped.
    pub fn read<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        self.values
            .get(key)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or(default)
    }

    pub fn read_bool(&self, key: &str, default: bool) -> bool {
        self.read(key, default)
    }

    pub fn read_int(&self, key: &str, default: i64) -> i64 {
        self.read(key, default)
    }

    pub fn read_string(&self, key: &str, default: &str) -> String {
        self.read(key, default.to_string())
    }

    /// 寫入設定（僅在記憶體，需呼叫 `save`）。 / Stores a value in memory; call [`SettingsStore::save`] to persist.
    pub fn write<T>(&mut self, key: &str, value: T) -> Result<(), SettingsError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value).map_err(|source| SettingsError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// 原子寫回磁碟；記憶體設定不做任何事。 / Writes the store atomically; a no-op for in-memory stores.
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let payload =
            serde_json::to_vec_pretty(&self.values).map_err(|source| SettingsError::Serialize {
                key: String::new(),
                source,
            })?;
        write_atomic(path, &payload).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
