/*!
 * Persisted selection ledgers.
 *
 * Two flat-file stores keep runs from repeating themselves:
 *
 * - the dedup ledger maps each source to the unit ids already consumed and
 *   keeps a list of sources found structurally unsuitable;
 * - the produced ledger is an append-only record of finished videos.
 *
 * Both tolerate a missing or corrupted file by resetting to empty with a
 * warning (the data is re-derivable), and both persist on every mutation.
 * A failed write is reported but never aborts the in-memory run.
 *
 * A single run owns the stores exclusively; concurrent runs against the
 * same source would need an external writer lock.
 */

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::{error, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// On-disk shape of the dedup store
#[derive(Debug, Default, Serialize, Deserialize)]
struct DedupState {
    /// Source id -> sorted consumed unit ids
    #[serde(default)]
    consumed: BTreeMap<String, BTreeSet<String>>,
    /// Sources found structurally unsuitable, sorted
    #[serde(default)]
    unsuitable_sources: BTreeSet<String>,
}

/// Durable record of consumed units and unsuitable sources
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    state: Mutex<DedupState>,
}

impl DedupLedger {
    /// Open the ledger at `path`, treating a missing or unreadable store
    /// as empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match load_json::<DedupState>(&path) {
            LoadOutcome::Loaded(state) => state,
            LoadOutcome::Missing => DedupState::default(),
            LoadOutcome::Corrupt(e) => {
                warn!(
                    "Dedup ledger {} unreadable ({}); starting from empty",
                    path.display(),
                    e
                );
                DedupState::default()
            }
        };
        DedupLedger {
            path,
            state: Mutex::new(state),
        }
    }

    /// Unit ids already consumed for a source
    pub fn consumed_for(&self, source_id: &str) -> HashSet<String> {
        let state = self.state.lock();
        state
            .consumed
            .get(source_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Record consumed unit ids for a source and persist.
    ///
    /// Union semantics: recording the same ids twice leaves the persisted
    /// set unchanged. Ids are never removed.
    pub fn record<S: AsRef<str>>(&self, source_id: &str, ids: &[S]) {
        let mut state = self.state.lock();
        let entry = state.consumed.entry(source_id.to_string()).or_default();
        for id in ids {
            entry.insert(id.as_ref().to_string());
        }
        persist_json(&self.path, &*state);
    }

    /// Whether a source was previously marked unsuitable
    pub fn is_source_unsuitable(&self, source_id: &str) -> bool {
        self.state.lock().unsuitable_sources.contains(source_id)
    }

    /// Mark a source as structurally unsuitable and persist.
    pub fn mark_source_unsuitable(&self, source_id: &str) {
        if source_id.is_empty() {
            warn!("Refusing to mark an empty source id as unsuitable");
            return;
        }
        let mut state = self.state.lock();
        if state.unsuitable_sources.insert(source_id.to_string()) {
            persist_json(&self.path, &*state);
        }
    }
}

/// One finished-video record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducedRecord {
    /// Source identifier the video was produced from
    pub source_id: String,
    /// Thread title at production time
    pub title: String,
    /// Finished output filename
    pub filename: String,
    /// Local timestamp of production
    pub timestamp: String,
}

impl ProducedRecord {
    pub fn now(source_id: impl Into<String>, title: impl Into<String>, filename: impl Into<String>) -> Self {
        ProducedRecord {
            source_id: source_id.into(),
            title: title.into(),
            filename: filename.into(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Append-only record of already-produced videos
#[derive(Debug)]
pub struct ProducedLedger {
    path: PathBuf,
    entries: Mutex<Vec<ProducedRecord>>,
}

impl ProducedLedger {
    /// Open the ledger at `path`, treating a missing or unreadable store
    /// as empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match load_json::<Vec<ProducedRecord>>(&path) {
            LoadOutcome::Loaded(entries) => entries,
            LoadOutcome::Missing => Vec::new(),
            LoadOutcome::Corrupt(e) => {
                warn!(
                    "Produced ledger {} unreadable ({}); starting from empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };
        ProducedLedger {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Whether a source already has a finished video
    pub fn contains(&self, source_id: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|record| record.source_id == source_id)
    }

    /// Append a record and persist. Appending a duplicate source id is
    /// allowed; forced re-productions legitimately repeat a source.
    pub fn append(&self, record: ProducedRecord) {
        let mut entries = self.entries.lock();
        entries.push(record);
        persist_json(&self.path, &*entries);
    }

    /// Number of recorded productions
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

enum LoadOutcome<T> {
    Loaded(T),
    Missing,
    Corrupt(anyhow::Error),
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> LoadOutcome<T> {
    if !path.exists() {
        return LoadOutcome::Missing;
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => return LoadOutcome::Corrupt(e.into()),
    };
    match serde_json::from_str(&raw) {
        Ok(value) => LoadOutcome::Loaded(value),
        Err(e) => LoadOutcome::Corrupt(e.into()),
    }
}

// Serialize to a temp file in the target directory, then rename over the
// store so readers never observe a half-written file.
fn persist_json<T: Serialize>(path: &Path, value: &T) {
    if let Err(e) = try_persist_json(path, value) {
        error!("Failed to persist ledger {}: {}", path.display(), e);
    }
}

fn try_persist_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create ledger directory {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .context("Failed to create temporary ledger file")?;
    let payload = serde_json::to_string_pretty(value).context("Failed to encode ledger")?;
    tmp.write_all(payload.as_bytes())
        .context("Failed to write ledger payload")?;
    tmp.persist(path).map_err(|e| {
        anyhow::anyhow!("Failed to replace ledger file {}: {}", path.display(), e)
    })?;
    Ok(())
}
