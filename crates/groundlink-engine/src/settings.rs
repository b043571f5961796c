// ── Persisted settings ──
//
// One JSON document holding a dictionary per known device. Feature
// controllers get a `SettingsStore` scoped to a nested dictionary of their
// device and read or write plain values under string keys. Writes land in
// memory immediately; `commit` flushes the whole document to disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::EngineError;

const VERSION_KEY: &str = "version";
const CURRENT_VERSION: u64 = 1;
const DEVICES_KEY: &str = "devices";

/// Device dictionary key holding the model name.
pub const DEVICE_MODEL_KEY: &str = "model";
/// Device dictionary key holding the device name.
pub const DEVICE_NAME_KEY: &str = "name";

struct StoreInner {
    path: Option<PathBuf>,
    root: Mutex<Map<String, Value>>,
}

/// Root of all persisted device data. Cheaply cloneable.
#[derive(Clone)]
pub struct PersistentStore {
    inner: Arc<StoreInner>,
}

impl PersistentStore {
    /// Opens the store backed by `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let mut root = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<Map<String, Value>>(&text).map_err(|source| {
                EngineError::StoreFormat {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(EngineError::StoreRead { path, source }),
        };
        if root.get(VERSION_KEY).and_then(Value::as_u64) != Some(CURRENT_VERSION) {
            debug!(path = %path.display(), "initializing settings store version");
            root.insert(VERSION_KEY.into(), Value::from(CURRENT_VERSION));
        }
        Ok(Self::with_root(Some(path), root))
    }

    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        let mut root = Map::new();
        root.insert(VERSION_KEY.into(), Value::from(CURRENT_VERSION));
        Self::with_root(None, root)
    }

    fn with_root(path: Option<PathBuf>, root: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path,
                root: Mutex::new(root),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Uids of all devices with a stored dictionary.
    pub fn device_uids(&self) -> Vec<String> {
        let root = self.inner.root.lock();
        root.get(DEVICES_KEY)
            .and_then(Value::as_object)
            .map(|devices| devices.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Settings dictionary of device `uid`.
    pub fn device(&self, uid: &str) -> SettingsStore {
        SettingsStore {
            store: self.clone(),
            path: vec![DEVICES_KEY.to_owned(), uid.to_owned()],
        }
    }

    /// Writes the whole document to disk. No-op for in-memory stores.
    pub fn commit(&self) -> Result<(), EngineError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        let text = {
            let root = self.inner.root.lock();
            serde_json::to_string_pretty(&*root)?
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| EngineError::StoreWrite {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| EngineError::StoreWrite {
            path: path.clone(),
            source,
        })
    }
}

impl fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentStore")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

/// Key/value view over one nested dictionary of the persistent store.
#[derive(Clone)]
pub struct SettingsStore {
    store: PersistentStore,
    path: Vec<String>,
}

impl SettingsStore {
    /// Nested dictionary under `key`.
    pub fn child(&self, key: &str) -> Self {
        let mut path = self.path.clone();
        path.push(key.to_owned());
        Self {
            store: self.store.clone(),
            path,
        }
    }

    /// Whether nothing has been stored here yet.
    pub fn is_new(&self) -> bool {
        let root = self.store.inner.root.lock();
        dict(&root, &self.path).is_none_or(Map::is_empty)
    }

    pub fn has_entry(&self, key: &str) -> bool {
        let root = self.store.inner.root.lock();
        dict(&root, &self.path).is_some_and(|d| d.contains_key(key))
    }

    /// Stores `value` under `key`. Unencodable values are logged and skipped.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> &Self {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "setting value not encodable, skipped");
                return self;
            }
        };
        let mut root = self.store.inner.root.lock();
        if let Some(dict) = dict_mut(&mut root, &self.path) {
            dict.insert(key.to_owned(), value);
        }
        self
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let root = self.store.inner.root.lock();
            dict(&root, &self.path)?.get(key)?.clone()
        };
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "stored setting has unexpected type");
                None
            }
        }
    }

    pub fn write_range(&self, key: &str, min: f64, max: f64) -> &Self {
        self.write(key, &[min, max])
    }

    pub fn read_range(&self, key: &str) -> Option<(f64, f64)> {
        self.read(key)
    }

    /// Removes this dictionary and everything below it, then commits.
    pub fn clear(&self) {
        {
            let mut root = self.store.inner.root.lock();
            if let Some((last, parents)) = self.path.split_last() {
                if let Some(parent) = dict_lookup_mut(&mut root, parents) {
                    parent.remove(last);
                }
            }
        }
        self.commit();
    }

    /// Flushes the backing store. Failures are logged.
    pub fn commit(&self) {
        if let Err(e) = self.store.commit() {
            warn!(error = %e, "failed to persist settings");
        }
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ── Dictionary navigation ────────────────────────────────────────────

fn dict<'a>(root: &'a Map<String, Value>, path: &[String]) -> Option<&'a Map<String, Value>> {
    path.iter()
        .try_fold(root, |map, key| map.get(key)?.as_object())
}

fn dict_lookup_mut<'a>(
    mut map: &'a mut Map<String, Value>,
    path: &[String],
) -> Option<&'a mut Map<String, Value>> {
    for key in path {
        map = map.get_mut(key)?.as_object_mut()?;
    }
    Some(map)
}

/// Walks `path`, creating (or replacing non-object values with) empty
/// dictionaries along the way.
fn dict_mut<'a>(
    mut map: &'a mut Map<String, Value>,
    path: &[String],
) -> Option<&'a mut Map<String, Value>> {
    for key in path {
        if !map.get(key).is_some_and(Value::is_object) {
            map.insert(key.clone(), Value::Object(Map::new()));
        }
        map = map.get_mut(key)?.as_object_mut()?;
    }
    Some(map)
}
