//! File-backed document store.
//!
//! Layout: `{root}/{collection}.json`, each file a JSON array of documents.
//! Replacing a collection writes `{collection}.json.tmp` and renames it over
//! the old file, so a concurrent reader sees either the old or the new table.

use super::{with_row_ids, ReferenceStore, StoreError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl ReferenceStore for FileStore {
    fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StoreError::Unavailable(format!("read {}: {e}", self.root.display())))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| StoreError::Unavailable(format!("dir entry: {e}")))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_collection(&self, name: &str) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(name);
        if !path.is_file() {
            return Err(StoreError::CollectionMissing {
                name: name.to_string(),
            });
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| StoreError::Unavailable(format!("read {}: {e}", path.display())))?;
        let documents: Vec<Value> =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!(collection = name, rows = documents.len(), "scanned collection");
        Ok(documents)
    }

    fn replace_collection(&self, name: &str, documents: Vec<Value>) -> Result<usize, StoreError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::Unavailable(format!("create {}: {e}", self.root.display())))?;

        let documents = with_row_ids(documents);
        let count = documents.len();
        let body = serde_json::to_vec(&documents).map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            reason: format!("encode: {e}"),
        })?;

        let path = self.collection_path(name);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, body)
            .map_err(|e| StoreError::Unavailable(format!("write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Unavailable(format!("swap {}: {e}", path.display()))
        })?;

        info!(collection = name, rows = count, "replaced collection");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replace_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("universe"));

        store
            .replace_collection("nyse", vec![json!({"exchange_symbol": "A"})])
            .unwrap();
        let docs = store.read_collection("nyse").unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["exchange_symbol"], "A");
        assert_eq!(docs[0]["_id"], 0);
    }

    #[test]
    fn replace_is_wholesale() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());

        store
            .replace_collection("sp500", vec![json!({"symbol": "A"}), json!({"symbol": "B"})])
            .unwrap();
        store
            .replace_collection("sp500", vec![json!({"symbol": "C"})])
            .unwrap();

        let docs = store.read_collection("sp500").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["symbol"], "C");
        assert!(!tmp.path().join("sp500.json.tmp").exists());
    }

    #[test]
    fn missing_collection_and_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());

        assert!(matches!(
            store.read_collection("nyse"),
            Err(StoreError::CollectionMissing { .. })
        ));
        assert!(store.collection_names().unwrap().is_empty());

        store.replace_collection("nyse", Vec::new()).unwrap();
        store.replace_collection("sp500", Vec::new()).unwrap();
        assert_eq!(store.collection_names().unwrap(), vec!["nyse", "sp500"]);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("nyse.json"), "not json").unwrap();
        let store = FileStore::new(tmp.path());

        assert!(matches!(
            store.read_collection("nyse"),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
