//! Local persistence of user profiles.
//!
//! Two records live in a flat key-value store: the active user, and a
//! directory of every known user keyed by id. Both are JSON. Saves overwrite
//! whole records; merging field updates is the caller's job.

use fluent_tutor_types::User;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const ACTIVE_USER_KEY: &str = "fluent_ai_active_user";
pub const USERS_DIRECTORY_KEY: &str = "fluent_ai_users_directory";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on record '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize record '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid record key: {0}")]
    InvalidKey(String),
}

/// A flat string-to-string store, the shape of browser local storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Write beside the target and rename so a crash never leaves half a record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| StoreError::Io {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Loads and saves profiles through a [`KeyValueStore`].
pub struct ProfileStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Reads the active user. Missing or unreadable data means logged out.
    pub fn load(&self) -> Option<User> {
        let raw = match self.kv.get(ACTIVE_USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read active user record: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Ignoring undecodable active user record: {}", e);
                None
            }
        }
    }

    /// Upserts `user` into the directory and makes it the active user.
    pub fn save(&mut self, user: &User) -> Result<(), StoreError> {
        let value = serde_json::to_value(user).map_err(|source| StoreError::Serialize {
            key: ACTIVE_USER_KEY.to_string(),
            source,
        })?;

        let mut directory = self.directory();
        directory.insert(user.id.to_string(), value.clone());
        let directory_json = serde_json::to_string(&Value::Object(directory)).map_err(|source| {
            StoreError::Serialize {
                key: USERS_DIRECTORY_KEY.to_string(),
                source,
            }
        })?;
        self.kv.set(USERS_DIRECTORY_KEY, &directory_json)?;
        self.kv.set(ACTIVE_USER_KEY, &value.to_string())?;
        tracing::debug!("saved profile {} ({})", user.id, user.name);
        Ok(())
    }

    /// Looks up a known user in the directory.
    pub fn find(&self, id: &str) -> Option<User> {
        let value = self.directory().remove(id)?;
        serde_json::from_value(value)
            .map_err(|e| tracing::warn!("Ignoring undecodable directory entry {}: {}", id, e))
            .ok()
    }

    /// Clears the active-user pointer. The directory is kept.
    pub fn sign_out(&mut self) -> Result<(), StoreError> {
        self.kv.remove(ACTIVE_USER_KEY)
    }

    /// The raw directory. Entries are kept as JSON values so that one record
    /// that no longer decodes does not take the others down with it.
    fn directory(&self) -> Map<String, Value> {
        let raw = match self.kv.get(USERS_DIRECTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(e) => {
                tracing::warn!("Failed to read users directory: {}", e);
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!("Replacing malformed users directory");
                Map::new()
            }
        }
    }
}
