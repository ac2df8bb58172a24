use crate::position::Position;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage format failure: {0}")]
    Format(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Per-book durable reading state. One record per book identity; created on
/// first open, updated on every save, never deleted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub book: String,
    pub last_position: Position,
    #[serde(default)]
    pub total_reading_seconds: u64,
    pub last_opened_at: DateTime<Utc>,
}

/// A saved place in a book. Several bookmarks may share a position (with
/// different notes); identity is the store-assigned `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    pub book: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Narrow CRUD boundary between the reading session and durable storage.
/// The session's in-memory position stays the source of truth while open;
/// the store is the source of truth across process restarts.
pub trait PersistenceGateway: Send + Sync {
    fn load_record(&self, book: &str) -> Result<Option<ReadingRecord>, StorageError>;
    fn save_record(&self, record: &ReadingRecord) -> Result<(), StorageError>;
    fn load_bookmarks(&self, book: &str) -> Result<Vec<Bookmark>, StorageError>;
    /// Insert (id 0) or update (id != 0) a bookmark; returns its id.
    fn save_bookmark(&self, bookmark: &Bookmark) -> Result<u64, StorageError>;
    fn delete_bookmark(&self, id: u64) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default = "first_bookmark_id")]
    next_bookmark_id: u64,
    records: HashMap<String, ReadingRecord>,
    bookmarks: Vec<Bookmark>,
}

fn first_bookmark_id() -> u64 {
    1
}

/// JSON-file store. All reads come from the in-memory copy; every mutation
/// rewrites the file while holding the lock, so a background auto-save and
/// a foreground save can never interleave halves of one record.
pub struct JsonStore {
    file_path: Option<PathBuf>,
    state: Mutex<StoreData>,
}

impl JsonStore {
    /// In-memory store that never touches disk. Used by tests and as the
    /// fallback when no data directory can be resolved.
    pub fn ephemeral() -> Self {
        Self {
            file_path: None,
            state: Mutex::new(StoreData {
                next_bookmark_id: 1,
                ..StoreData::default()
            }),
        }
    }

    pub fn load_from_file(file_path: &Path) -> Result<Self, StorageError> {
        let data = if file_path.exists() {
            let content = fs::read_to_string(file_path)?;
            serde_json::from_str(&content)?
        } else {
            StoreData {
                next_bookmark_id: 1,
                ..StoreData::default()
            }
        };
        Ok(Self {
            file_path: Some(file_path.to_path_buf()),
            state: Mutex::new(data),
        })
    }

    /// Load from `file_path`, falling back to an ephemeral store when the
    /// file is unreadable (reading must keep working without persistence).
    pub fn load_or_ephemeral(file_path: Option<&Path>) -> Self {
        match file_path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                log::error!("Failed to load reading records from {path:?}: {e}");
                Self {
                    file_path: Some(path.to_path_buf()),
                    state: Mutex::new(StoreData {
                        next_bookmark_id: 1,
                        ..StoreData::default()
                    }),
                }
            }),
            None => Self::ephemeral(),
        }
    }

    fn flush(&self, data: &StoreData) -> Result<(), StorageError> {
        if let Some(path) = &self.file_path {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            let content = serde_json::to_string_pretty(data)?;
            fs::write(path, content)?;
        }
        Ok(())
    }
}

impl PersistenceGateway for JsonStore {
    fn load_record(&self, book: &str) -> Result<Option<ReadingRecord>, StorageError> {
        let data = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(data.records.get(book).cloned())
    }

    fn save_record(&self, record: &ReadingRecord) -> Result<(), StorageError> {
        let mut data = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        data.records.insert(record.book.clone(), record.clone());
        self.flush(&data)
    }

    fn load_bookmarks(&self, book: &str) -> Result<Vec<Bookmark>, StorageError> {
        let data = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        let mut bookmarks: Vec<Bookmark> = data
            .bookmarks
            .iter()
            .filter(|b| b.book == book)
            .cloned()
            .collect();
        bookmarks.sort_by_key(|b| (b.position, b.id));
        Ok(bookmarks)
    }

    fn save_bookmark(&self, bookmark: &Bookmark) -> Result<u64, StorageError> {
        let mut data = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        let id = if bookmark.id == 0 {
            let id = data.next_bookmark_id;
            data.next_bookmark_id += 1;
            let mut stored = bookmark.clone();
            stored.id = id;
            data.bookmarks.push(stored);
            id
        } else {
            match data.bookmarks.iter_mut().find(|b| b.id == bookmark.id) {
                Some(existing) => *existing = bookmark.clone(),
                None => data.bookmarks.push(bookmark.clone()),
            }
            bookmark.id
        };
        self.flush(&data)?;
        Ok(id)
    }

    fn delete_bookmark(&self, id: u64) -> Result<(), StorageError> {
        let mut data = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        data.bookmarks.retain(|b| b.id != id);
        self.flush(&data)
    }
}

/// Default store location: `<data_dir>/quire/records.json`.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("quire").join("records.json"))
}
