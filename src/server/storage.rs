//! File-backed JSON document storage.
//!
//! Documents are stored one file per document:
//! ```text
//! <DATA_DIR>/
//!   workout_plans/
//!     plan_1.json
//!     plan_2.json
//!   users/
//!     <uid>.json
//! ```
//!
//! Writes go through a temp file and a rename, serialized by one lock per
//! store. Reads take no lock.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// A schemaless document: top-level field name to JSON value.
pub type Document = Map<String, Value>;

/// Collections clients may read and write.
pub const COLLECTIONS: &[&str] = &["users", "workout_plans", "workout_progress", "coaches"];

/// Errors that can occur during document storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// A stored file is not a JSON object.
    CorruptDocument(PathBuf, String),
    /// Collection or document id that cannot be used as a file name.
    InvalidName(String),
    /// The document does not exist.
    NotFound { collection: String, id: String },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::CorruptDocument(path, e) => {
                write!(f, "Failed to read document {}: {}", path.display(), e)
            }
            StorageError::InvalidName(name) => write!(f, "Invalid name: {}", name),
            StorageError::NotFound { collection, id } => {
                write!(f, "Document {}/{} not found", collection, id)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Server-side storage for JSON documents grouped in collections.
#[derive(Debug)]
pub struct DocumentStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Validates a collection name or document id to prevent path traversal.
    fn validate_name(name: &str) -> Result<(), StorageError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name.starts_with('.')
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.data_dir.join(collection)
    }

    fn doc_path(&self, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(collection).join(format!("{}.json", id))
    }

    /// Copies the storage key into the document body.
    ///
    /// Every document gets `id`; user profiles also get `uid`.
    fn with_key(collection: &str, id: &str, mut doc: Document) -> Document {
        doc.insert("id".to_string(), Value::String(id.to_string()));
        if collection == "users" {
            doc.insert("uid".to_string(), Value::String(id.to_string()));
        }
        doc
    }

    fn read_file(path: &Path) -> Result<Option<Document>, StorageError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::IoError(path.to_path_buf(), e)),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(doc)) => Ok(Some(doc)),
            Ok(_) => Err(StorageError::CorruptDocument(
                path.to_path_buf(),
                "not a JSON object".to_string(),
            )),
            Err(e) => Err(StorageError::CorruptDocument(path.to_path_buf(), e.to_string())),
        }
    }

    fn write_file(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StorageError> {
        let dir = self.collection_dir(collection);
        let path = self.doc_path(collection, id);

        fs::create_dir_all(&dir).map_err(|e| StorageError::IoError(dir.clone(), e))?;

        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| StorageError::CorruptDocument(path.clone(), e.to_string()))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, bytes).map_err(|e| StorageError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| StorageError::IoError(path, e))?;

        Ok(())
    }

    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        Self::validate_name(collection)?;
        Self::validate_name(id)?;

        let doc = Self::read_file(&self.doc_path(collection, id))?;
        Ok(doc.map(|d| Self::with_key(collection, id, d)))
    }

    /// Lists documents whose top-level fields equal every filter value.
    ///
    /// Strings compare as is; other values compare by their JSON text, so
    /// `isCompleted=true` matches a boolean field. Results are ordered by id.
    pub fn list(
        &self,
        collection: &str,
        filters: &[(String, String)],
    ) -> Result<Vec<Document>, StorageError> {
        Self::validate_name(collection)?;

        let dir = self.collection_dir(collection);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::IoError(dir, e)),
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        ids.sort();

        let mut docs = Vec::new();
        for id in ids {
            let path = self.doc_path(collection, &id);
            let doc = match Self::read_file(&path) {
                Ok(Some(doc)) => doc,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Skipping unreadable document: {}", e);
                    continue;
                }
            };
            let doc = Self::with_key(collection, &id, doc);
            if matches_filters(&doc, filters) {
                docs.push(doc);
            }
        }

        Ok(docs)
    }

    /// Creates or replaces a document.
    pub fn put(&self, collection: &str, id: &str, doc: Document) -> Result<Document, StorageError> {
        Self::validate_name(collection)?;
        Self::validate_name(id)?;

        let doc = Self::with_key(collection, id, doc);
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_file(collection, id, &doc)?;
        Ok(doc)
    }

    /// Overwrites the given top-level fields of an existing document.
    pub fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Document, StorageError> {
        Self::validate_name(collection)?;
        Self::validate_name(id)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = Self::read_file(&self.doc_path(collection, id))?.ok_or_else(|| {
            StorageError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        })?;

        for (key, value) in fields {
            doc.insert(key, value);
        }

        let doc = Self::with_key(collection, id, doc);
        self.write_file(collection, id, &doc)?;
        Ok(doc)
    }

    /// Stores a document under its own `id`, or a generated one.
    pub fn insert(&self, collection: &str, doc: Document) -> Result<Document, StorageError> {
        let id = match doc.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        self.put(collection, &id, doc)
    }
}

fn matches_filters(doc: &Document, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(field, expected)| match doc.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == *expected,
        None => false,
    })
}
