use crate::catalog::Product;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SELECTION_FILE_NAME: &str = "selected_products.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize selection: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable home of the selection. One value, overwritten on every mutation.
pub trait SelectionStore: Send {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<Product>>, StorageError>;

    fn save(&mut self, products: &[Product]) -> Result<(), StorageError>;
}

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SELECTION_FILE_NAME)
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })
    }
}

impl SelectionStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Product>>, StorageError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        read_selection_file(&path).map(Some)
    }

    fn save(&mut self, products: &[Product]) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let final_path = self.path();
        let tmp_path = self.dir.join(format!("{SELECTION_FILE_NAME}.tmp"));
        let bytes = serde_json::to_vec_pretty(products)?;

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| StorageError::Io { path, source }
        };

        fs::write(&tmp_path, bytes).map_err(io_err(&tmp_path))?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if final_path.exists() {
                    fs::remove_file(&final_path).map_err(io_err(&final_path))?;
                    fs::rename(&tmp_path, &final_path).map_err(io_err(&final_path))
                } else {
                    Err(StorageError::Io {
                        path: final_path,
                        source: rename_err,
                    })
                }
            }
        }
    }
}

fn read_selection_file(path: &Path) -> Result<Vec<Product>, StorageError> {
    let data = fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Keeps the serialized selection in memory. Clones share the same slot so a
/// test can inspect what the manager persisted.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    json: std::sync::Arc<std::sync::Mutex<Option<String>>>,
}

#[cfg(test)]
impl InMemoryStore {
    pub fn with_json(json: impl Into<String>) -> Self {
        let store = Self::default();
        *store.slot() = Some(json.into());
        store
    }

    pub fn json(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.json.lock().expect("memory store lock should not be poisoned")
    }
}

#[cfg(test)]
impl SelectionStore for InMemoryStore {
    fn load(&self) -> Result<Option<Vec<Product>>, StorageError> {
        match self.slot().as_deref() {
            None => Ok(None),
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|source| StorageError::Parse {
                    path: PathBuf::from("<memory>"),
                    source,
                }),
        }
    }

    fn save(&mut self, products: &[Product]) -> Result<(), StorageError> {
        *self.slot() = Some(serde_json::to_string(products)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "routine_advisor_store_{prefix}_{}_{}",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn missing_file_loads_as_nothing_stored() {
        let store = JsonFileStore::new(temp_dir("missing"));
        assert!(store.load().expect("missing file is not an error").is_none());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = temp_dir("roundtrip");
        let mut store = JsonFileStore::new(&dir);
        let selection = vec![product(7, "Toner", "toner"), product(2, "Serum", "serum")];

        store.save(&selection).expect("selection should save");
        store.save(&selection[..1]).expect("overwrite should succeed");
        store.save(&selection).expect("second overwrite should succeed");

        let reloaded = JsonFileStore::new(&dir)
            .load()
            .expect("stored selection should load")
            .expect("selection should be present");
        assert_eq!(reloaded, selection);
        assert!(!dir.join(format!("{SELECTION_FILE_NAME}.tmp")).exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_reports_parse_error() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).expect("fixture dir should exist");
        fs::write(dir.join(SELECTION_FILE_NAME), "[{\"id\": ").expect("fixture should write");

        let error = JsonFileStore::new(&dir)
            .load()
            .expect_err("corrupt file should fail");
        assert!(matches!(error, StorageError::Parse { .. }));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn in_memory_store_serializes_as_json_array() {
        let mut store = InMemoryStore::default();
        store
            .save(&[product(1, "Cleanser", "cleanser")])
            .expect("memory save should succeed");
        let json = store.json().expect("json should be stored");
        assert!(json.starts_with('['));
        assert!(json.contains("\"name\":\"Cleanser\""));
    }
}
