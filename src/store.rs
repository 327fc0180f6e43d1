use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub frequency: u64,
    pub last_used: i64,
}

/// Read/write surface the selection session depends on. `get_all` returns a
/// defensive copy so callers can never alias the stored records.
pub trait CommandStore {
    /// Snapshot of every record, most used first (frequency desc, then
    /// last_used desc).
    fn get_all(&self) -> Vec<CommandRecord>;

    /// Counts a use of `text`. An existing record gets its frequency bumped
    /// and its timestamp refreshed; tags only apply when the record is new.
    fn record_usage(&self, text: &str, tags: &[String]) -> Result<()>;
}

impl<S: CommandStore + ?Sized> CommandStore for &S {
    fn get_all(&self) -> Vec<CommandRecord> {
        (**self).get_all()
    }

    fn record_usage(&self, text: &str, tags: &[String]) -> Result<()> {
        (**self).record_usage(text, tags)
    }
}

/// JSON-file-backed store. The record list is mutex-guarded; the lock is
/// held per operation, never across the interactive session.
#[derive(Debug)]
pub struct FileStore {
    records: Mutex<Vec<CommandRecord>>,
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            path,
        }
    }

    /// Opens the store at `path`. A missing file is an empty store; a
    /// malformed one is an error the caller may recover from with `new`.
    pub fn open(path: PathBuf) -> Result<Self> {
        let records = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("malformed command store {}", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read command store {}", path.display()));
            }
        };

        Ok(Self {
            records: Mutex::new(records),
            path,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CommandRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self, records: &[CommandRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store directory {}", parent.display()))?;
        }

        let serialized =
            serde_json::to_string_pretty(records).context("failed to serialize command store")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write command store {}", self.path.display()))
    }
}

impl CommandStore for FileStore {
    fn get_all(&self) -> Vec<CommandRecord> {
        let mut records = self.lock().clone();
        records.sort_by(|a, b| match b.frequency.cmp(&a.frequency) {
            Ordering::Equal => b.last_used.cmp(&a.last_used),
            other => other,
        });
        records
    }

    fn record_usage(&self, text: &str, tags: &[String]) -> Result<()> {
        let mut records = self.lock();
        match records.iter_mut().find(|record| record.text == text) {
            Some(record) => {
                record.frequency = record.frequency.saturating_add(1);
                record.last_used = unix_timestamp();
            }
            None => records.push(CommandRecord {
                text: text.to_string(),
                tags: tags.to_vec(),
                frequency: 1,
                last_used: unix_timestamp(),
            }),
        }

        // The in-memory update above survives even if this write fails; the
        // caller surfaces the error as a warning and keeps going.
        self.save_locked(&records)
    }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_temp_dir() -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("mnemo-store-test-{nonce}"));
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn record(text: &str, frequency: u64, last_used: i64) -> CommandRecord {
        CommandRecord {
            text: text.to_string(),
            tags: Vec::new(),
            frequency,
            last_used,
        }
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = make_temp_dir();
        let store = FileStore::open(dir.join("commands.json")).unwrap();
        assert!(store.get_all().is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = make_temp_dir();
        let path = dir.join("commands.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open(path).unwrap_err().to_string();
        assert!(err.contains("malformed command store"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn usage_creates_then_increments() {
        let dir = make_temp_dir();
        let store = FileStore::new(dir.join("commands.json"));

        store
            .record_usage("git status", &["git".to_string()])
            .unwrap();
        store.record_usage("git status", &[]).unwrap();

        let records = store.get_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "git status");
        assert_eq!(records[0].frequency, 2);
        assert_eq!(records[0].tags, vec!["git".to_string()]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn existing_record_ignores_passed_tags() {
        let dir = make_temp_dir();
        let store = FileStore::new(dir.join("commands.json"));

        store.record_usage("ls -la", &[]).unwrap();
        store.record_usage("ls -la", &["files".to_string()]).unwrap();

        assert!(store.get_all()[0].tags.is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn snapshot_orders_by_frequency_then_recency() {
        let dir = make_temp_dir();
        let store = FileStore::new(dir.join("commands.json"));
        {
            let mut records = store.lock();
            records.push(record("git status", 5, 100));
            records.push(record("git commit", 2, 300));
            records.push(record("ls -la", 9, 50));
            records.push(record("cargo test", 2, 400));
        }

        let snapshot = store.get_all();
        let texts: Vec<&str> = snapshot.iter().map(|record| record.text.as_str()).collect();
        assert_eq!(texts, vec!["ls -la", "git status", "cargo test", "git commit"]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn snapshot_is_a_defensive_copy() {
        let dir = make_temp_dir();
        let store = FileStore::new(dir.join("commands.json"));
        store.record_usage("git status", &[]).unwrap();

        let mut snapshot = store.get_all();
        snapshot[0].text = "mutated".to_string();
        snapshot.clear();

        assert_eq!(store.get_all()[0].text, "git status");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn records_round_trip_through_disk() {
        let dir = make_temp_dir();
        let path = dir.join("nested").join("commands.json");

        let store = FileStore::new(path.clone());
        store.record_usage("cargo build", &["rust".to_string()]).unwrap();
        store.record_usage("cargo build", &[]).unwrap();

        let reopened = FileStore::open(path).unwrap();
        let records = reopened.get_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "cargo build");
        assert_eq!(records[0].frequency, 2);
        assert_eq!(records[0].tags, vec!["rust".to_string()]);

        let _ = fs::remove_dir_all(dir);
    }
}
