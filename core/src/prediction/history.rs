//! Persisted prediction history
//!
//! Newest-first, at most [`HISTORY_CAPACITY`] entries, stored as one JSON array
//! under a fixed key. Entries are only ever prepended and trimmed.

use crate::error::{Error, Result};
use crate::model::PredictionHistoryEntry;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

pub const HISTORY_CAPACITY: usize = 5;
pub const DEFAULT_HISTORY_KEY: &str = "predictionHistory";

/// Durable slot holding the encoded history
pub trait HistoryStorage: Send + Sync {
    /// `None` when nothing has been stored yet
    fn read(&self) -> io::Result<Option<String>>;

    /// Replace the stored value in one step
    fn write(&self, contents: &str) -> io::Result<()>;
}

/// `<dir>/<key>.json`, replaced atomically through a temp file + rename
#[derive(Debug, Clone)]
pub struct FileHistoryStorage {
    path: PathBuf,
}

impl FileHistoryStorage {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStorage for FileHistoryStorage {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// In-process storage for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryHistoryStorage {
    value: Mutex<Option<String>>,
}

impl MemoryHistoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            value: Mutex::new(Some(contents.to_string())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryStorage for MemoryHistoryStorage {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }
}

/// Bounded newest-first sequence of past predictions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionHistory {
    entries: Vec<PredictionHistoryEntry>,
}

impl PredictionHistory {
    pub fn entries(&self) -> &[PredictionHistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&PredictionHistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend and trim to capacity
    pub fn record(&mut self, entry: PredictionHistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Capture time for the next entry, strictly after the current head
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.latest() {
            Some(head) if now <= head.timestamp => head.timestamp + Duration::microseconds(1),
            _ => now,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Decode a stored value, restoring ordering and capacity
    pub fn decode(raw: &str) -> Result<Self> {
        let mut entries: Vec<PredictionHistoryEntry> = serde_json::from_str(raw)
            .map_err(|e| Error::MalformedPersistedState(e.to_string()))?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(HISTORY_CAPACITY);
        Ok(Self { entries })
    }

    /// Load from storage; missing, unreadable or malformed state yields an empty history
    pub fn load(storage: &dyn HistoryStorage) -> Self {
        let raw = match storage.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted prediction history");
                return Self::default();
            }
            Err(e) => {
                warn!("Failed to read prediction history, starting empty: {}", e);
                return Self::default();
            }
        };

        match Self::decode(&raw) {
            Ok(history) => {
                debug!("Loaded {} prediction history entries", history.len());
                history
            }
            Err(e) => {
                warn!("Discarding prediction history: {}", e);
                Self::default()
            }
        }
    }

    /// Encode and write in one step
    pub fn persist(&self, storage: &dyn HistoryStorage) -> Result<()> {
        storage.write(&self.encode()?)?;
        Ok(())
    }
}
