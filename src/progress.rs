//! Completion tracking.
//!
//! An image counts as completed once more than half of its shapes carry a
//! non-blank fill. Completion is a one-way ratchet: ids are only ever added to
//! the persisted set, so clearing an image later does not un-complete it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::{log_err, log_info};

/// Store key holding the JSON array of completed ids.
pub const PROGRESS_KEY: &str = "coloredAnimals";

/// Ratio that must be exceeded (not merely reached) to complete an image.
pub const COMPLETION_THRESHOLD: f64 = 0.5;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

// ============================================================================
// STORES
// ============================================================================

/// Persistence for the completed set. Order is insertion order.
pub trait ProgressStore {
    fn load(&self) -> Result<Vec<String>, StoreError>;
    fn save(&mut self, ids: &[String]) -> Result<(), StoreError>;
}

/// In-process store, used by tests and as a fallback when no data directory
/// is writable.
#[derive(Clone, Debug, Default)]
pub struct MemoryProgressStore {
    ids: Vec<String>,
    /// Number of `save` calls, so callers can check that no-op marks do not write.
    pub writes: usize,
}

impl MemoryProgressStore {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            writes: 0,
        }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.ids.clone())
    }

    fn save(&mut self, ids: &[String]) -> Result<(), StoreError> {
        self.ids = ids.to_vec();
        self.writes += 1;
        Ok(())
    }
}

/// Key-value JSON file shaped like browser local storage: a flat object of
/// string keys to string values. The progress set lives under
/// [`PROGRESS_KEY`] as a JSON-encoded array string.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/ColorBook/progress.json`
    pub fn default_path() -> PathBuf {
        crate::logger::data_dir()
            .join(crate::logger::APP_DIR_NAME)
            .join("progress.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Vec<String>, StoreError> {
        match self.get_item(PROGRESS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, ids: &[String]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(ids)?;
        self.set_item(PROGRESS_KEY, &raw)
    }
}

// ============================================================================
// MEASUREMENT
// ============================================================================

/// True for fills that mean "not colored yet".
pub fn is_blank_fill(fill: &str) -> bool {
    let fill = fill.trim();
    ["white", "#fff", "#ffffff", "none"]
        .iter()
        .any(|blank| fill.eq_ignore_ascii_case(blank))
}

pub fn is_colored(fill: Option<&str>) -> bool {
    match fill {
        Some(f) => !f.trim().is_empty() && !is_blank_fill(f),
        None => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub colored: usize,
    pub total: usize,
}

impl Progress {
    pub fn measure(doc: &Document) -> Self {
        let colored = doc
            .shape_ids()
            .filter(|&id| is_colored(doc.fill(id)))
            .count();
        Self {
            colored,
            total: doc.shape_count(),
        }
    }

    /// `colored / total`, or 0 for an image without shapes.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.colored as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.ratio() > COMPLETION_THRESHOLD
    }

    pub fn percent(&self) -> u32 {
        (self.ratio() * 100.0).round() as u32
    }
}

// ============================================================================
// TRACKER
// ============================================================================

/// Result of re-evaluating a document after an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: Progress,
    /// The id was added to the completed set by this evaluation.
    pub newly_completed: bool,
}

pub struct ProgressTracker {
    store: Box<dyn ProgressStore>,
}

impl ProgressTracker {
    pub fn new(store: Box<dyn ProgressStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryProgressStore::default()))
    }

    /// Measure the document and mark `image_id` completed when the ratio
    /// passes the threshold. Store failures are logged, never raised.
    pub fn evaluate(&mut self, image_id: &str, doc: &Document) -> ProgressUpdate {
        let progress = Progress::measure(doc);
        let mut newly_completed = false;
        if progress.is_complete() {
            match self.mark_as_colored(image_id) {
                Ok(added) => newly_completed = added,
                Err(e) => log_err!("Could not save progress for '{}': {}", image_id, e),
            }
        }
        ProgressUpdate {
            progress,
            newly_completed,
        }
    }

    /// Add `image_id` to the completed set. Idempotent: returns `Ok(false)`
    /// without writing when it is already present.
    pub fn mark_as_colored(&mut self, image_id: &str) -> Result<bool, StoreError> {
        let mut ids = self.store.load()?;
        if ids.iter().any(|id| id == image_id) {
            return Ok(false);
        }
        ids.push(image_id.to_string());
        self.store.save(&ids)?;
        log_info!("Marked '{}' as colored", image_id);
        Ok(true)
    }

    /// Completed ids; empty (and logged) when the store cannot be read.
    pub fn completed(&self) -> Vec<String> {
        match self.store.load() {
            Ok(ids) => ids,
            Err(e) => {
                log_err!("Could not read progress: {}", e);
                Vec::new()
            }
        }
    }

    pub fn is_completed(&self, image_id: &str) -> bool {
        self.completed().iter().any(|id| id == image_id)
    }
}
