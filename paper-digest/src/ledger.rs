//! Persistent record of papers already handed to the summarizer.
//!
//! # Invariants
//! - Every mutating operation writes the whole ledger before returning, and
//!   the in-memory ledger changes only once that write succeeded.
//! - A missing or unreadable ledger file loads as an empty ledger.
//! - Write failures are returned to the caller, never swallowed.
//! - Entries whose `seen_at` cannot be parsed are never pruned.

use crate::recency::{days_before, parse_timestamp};
use crate::types::{DigestError, Paper, Result, SeenMark};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub title: String,
    /// Wall-clock time of marking. Only used for retention.
    #[serde(default)]
    pub seen_at: String,
}

/// In-memory ledger contents, in the shape they are stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default, serialize_with = "serialize_sorted")]
    papers: HashMap<String, LedgerEntry>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Writes entries in identifier order so successive saves diff cleanly.
fn serialize_sorted<S>(
    papers: &HashMap<String, LedgerEntry>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let ordered: BTreeMap<&String, &LedgerEntry> = papers.iter().collect();
    ordered.serialize(serializer)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    pub total_papers: usize,
    pub last_updated: Option<String>,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, LedgerEntry)>,
    {
        Self {
            papers: entries.into_iter().collect(),
            last_updated: None,
        }
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LedgerEntry> {
        self.papers.get(id)
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.papers.contains_key(id)
    }

    /// The papers not yet in the ledger, in their original order.
    pub fn filter_unseen(&self, papers: Vec<Paper>) -> Vec<Paper> {
        papers
            .into_iter()
            .filter(|paper| !self.is_seen(&paper.id))
            .collect()
    }

    fn upsert(&mut self, id: &str, title: &str, seen_at: String) {
        self.papers.insert(
            id.to_string(),
            LedgerEntry {
                title: title.to_string(),
                seen_at,
            },
        );
    }

    fn remove_seen_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.papers.len();
        self.papers.retain(|id, entry| match parse_timestamp(&entry.seen_at) {
            Some(seen_at) => seen_at >= cutoff,
            None => {
                debug!("Keeping ledger entry {} with unparsable seen_at {:?}", id, entry.seen_at);
                true
            }
        });
        before - self.papers.len()
    }
}

/// Durable storage for a whole ledger snapshot.
pub trait LedgerStore {
    /// Never fails: unreadable storage yields an empty ledger.
    fn load(&self) -> Ledger;

    fn save(&self, ledger: &Ledger) -> Result<()>;

    fn location(&self) -> String;
}

/// JSON file storage. Writes go to a temporary sibling file that is renamed
/// over the target, so a reader sees either the old or the new snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, message: String) -> DigestError {
        DigestError::LedgerWrite {
            path: self.path.clone(),
            message,
        }
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Ledger {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No history file at {}; starting empty", self.path.display());
                return Ledger::default();
            }
            Err(e) => {
                warn!(
                    "Failed to read history file {}: {}; starting empty",
                    self.path.display(),
                    e
                );
                return Ledger::default();
            }
        };

        match serde_json::from_str::<Ledger>(&raw) {
            Ok(ledger) => {
                debug!("Loaded {} history entries from {}", ledger.len(), self.path.display());
                ledger
            }
            Err(e) => {
                warn!(
                    "Failed to parse history file {}: {}; starting empty",
                    self.path.display(),
                    e
                );
                Ledger::default()
            }
        }
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                self.write_error(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let payload = serde_json::to_string_pretty(ledger)
            .map_err(|e| self.write_error(format!("failed to encode history: {}", e)))?;

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        std::fs::write(&temp_path, payload)
            .map_err(|e| self.write_error(format!("failed to write history: {}", e)))?;

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(self.write_error(format!("failed to replace history file: {}", e)));
        }

        debug!("Saved {} history entries to {}", ledger.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the last saved snapshot in memory. Used for tests and for runs that
/// must not touch the history file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Ledger>,
    saves: AtomicUsize,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            snapshot: Mutex::new(ledger),
            ..Self::default()
        }
    }

    /// A store whose every `save` fails.
    pub fn failing() -> Self {
        Self::failing_with(Ledger::default())
    }

    /// Loads `ledger` but refuses every `save`.
    pub fn failing_with(ledger: Ledger) -> Self {
        Self {
            snapshot: Mutex::new(ledger),
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Ledger {
        self.snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Ledger {
        self.snapshot()
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        if self.fail_writes {
            return Err(DigestError::LedgerWrite {
                path: PathBuf::from("<memory>"),
                message: "writes disabled".to_string(),
            });
        }
        *self
            .snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = ledger.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

/// A ledger bound to its durable storage.
pub struct SeenLedger<S: LedgerStore> {
    ledger: Ledger,
    store: S,
}

impl SeenLedger<JsonFileStore> {
    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self::open(JsonFileStore::new(path))
    }
}

impl<S: LedgerStore> SeenLedger<S> {
    pub fn open(store: S) -> Self {
        let ledger = store.load();
        Self { ledger, store }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.ledger.is_seen(id)
    }

    pub fn filter_unseen(&self, papers: Vec<Paper>) -> Vec<Paper> {
        self.ledger.filter_unseen(papers)
    }

    /// Records `id` as seen at `now`, overwriting any previous entry.
    pub fn mark_seen(&mut self, id: &str, title: &str, now: DateTime<Utc>) -> Result<()> {
        let mut next = self.ledger.clone();
        next.upsert(id, title, format_timestamp(now));
        self.commit(next, now)
    }

    /// Records a batch with one write. Marks with an empty id are skipped.
    /// Returns how many entries were recorded.
    pub fn mark_multiple<I>(&mut self, entries: I, now: DateTime<Utc>) -> Result<usize>
    where
        I: IntoIterator<Item = SeenMark>,
    {
        let seen_at = format_timestamp(now);
        let mut next = self.ledger.clone();
        let mut marked = 0;
        for entry in entries {
            if entry.id.is_empty() {
                continue;
            }
            next.upsert(&entry.id, &entry.title, seen_at.clone());
            marked += 1;
        }
        self.commit(next, now)?;
        Ok(marked)
    }

    /// Drops entries seen more than `retention_days` before `now`. A
    /// non-positive retention keeps everything. Writes only if something was
    /// removed.
    pub fn cleanup_old_entries(&mut self, now: DateTime<Utc>, retention_days: i64) -> Result<usize> {
        if retention_days <= 0 {
            return Ok(0);
        }

        let Some(cutoff) = days_before(now, retention_days) else {
            return Ok(0);
        };

        let mut next = self.ledger.clone();
        let removed = next.remove_seen_before(cutoff);
        if removed > 0 {
            self.commit(next, now)?;
            info!("Removed {} history entries older than {} days", removed, retention_days);
        }
        Ok(removed)
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_papers: self.ledger.len(),
            last_updated: self.ledger.last_updated.clone(),
        }
    }

    /// Saves `next` and only then makes it the current ledger, so a failed
    /// write leaves memory matching what is on disk.
    fn commit(&mut self, mut next: Ledger, now: DateTime<Utc>) -> Result<()> {
        next.last_updated = Some(format_timestamp(now));
        self.store.save(&next)?;
        self.ledger = next;
        Ok(())
    }
}
