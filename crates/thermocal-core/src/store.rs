//! Feedback Storage Layer
//!
//! Durable home of the append-only feedback history.
//!
//! ## Reading
//! `try_load_all` returns typed errors; `load_all` is the total variant used on
//! the request path. It never fails:
//! - missing file → empty history
//! - empty or whitespace-only file → empty history
//! - malformed file or I/O failure → empty history plus a warning
//!
//! Array entries that do not decode as a `FeedbackEvent` are skipped one by
//! one, the rest of the history is still used.
//!
//! ## Writing
//! `JsonFileStore::append` rewrites the whole array into a temporary file in
//! the same directory and renames it over the original, so concurrent readers
//! see either the old or the new file, never a partial one. Appends are
//! serialized through an async mutex.

use crate::error::{CoreError, Result};
use crate::event::FeedbackEvent;
use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Feedback storage trait
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Read every stored event, reporting failures
    async fn try_load_all(&self) -> Result<Vec<FeedbackEvent>>;

    /// Append one event to the history
    async fn append(&self, event: FeedbackEvent) -> Result<()>;

    /// Read every stored event; failures degrade to an empty history
    async fn load_all(&self) -> Vec<FeedbackEvent> {
        match self.try_load_all().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Feedback store unreadable, treating history as empty");
                Vec::new()
            }
        }
    }
}

/// Feedback history kept as one pretty-printed JSON array on disk
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw array entries; `None` when the file is absent or blank
    async fn read_entries(&self) -> Result<Option<Vec<Value>>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let entries: Vec<Value> = serde_json::from_str(&contents)?;
        Ok(Some(entries))
    }

    async fn replace(&self, entries: Vec<Value>) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &entries))
            .await
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl FeedbackStore for JsonFileStore {
    async fn try_load_all(&self) -> Result<Vec<FeedbackEvent>> {
        let Some(entries) = self.read_entries().await? else {
            return Ok(Vec::new());
        };

        let total = entries.len();
        let events: Vec<FeedbackEvent> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!(index = index, error = %e, "Skipping unreadable feedback entry");
                    None
                }
            })
            .collect();

        if events.len() < total {
            debug!(
                path = %self.path.display(),
                skipped = total - events.len(),
                "Some feedback entries were skipped"
            );
        }

        Ok(events)
    }

    async fn append(&self, event: FeedbackEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        // Work on raw entries so records this version cannot decode survive
        let mut entries = self.read_entries().await?.unwrap_or_default();
        entries.push(serde_json::to_value(&event)?);
        let total = entries.len();

        self.replace(entries).await?;

        info!(
            user_id = %event.user_id,
            feedback = %event.feedback,
            total = total,
            "Feedback recorded"
        );

        Ok(())
    }
}

fn write_atomically(path: &Path, entries: &[Value]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, entries)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

/// In-memory feedback storage
///
/// Suitable for tests and ephemeral deployments; history is lost on restart.
#[derive(Default)]
pub struct MemoryFeedbackStore {
    events: RwLock<Vec<FeedbackEvent>>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<FeedbackEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn try_load_all(&self) -> Result<Vec<FeedbackEvent>> {
        Ok(self.events.read().await.clone())
    }

    async fn append(&self, event: FeedbackEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EstimatorConfig;
    use crate::estimator::OffsetEstimator;
    use crate::event::{COLD, HOT};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("feedback_db.json"))
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.try_load_all().await.unwrap().is_empty());
        assert!(store.load_all().await.is_empty());
        assert!(!logs_contain("Feedback store unreadable"));
    }

    #[tokio::test]
    async fn test_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "  \n\t ").unwrap();

        assert!(store.try_load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.try_load_all().await, Err(CoreError::Json(_))));
        assert!(store.load_all().await.is_empty());
        assert!(logs_contain("Feedback store unreadable"));
    }

    #[tokio::test]
    async fn test_non_array_document_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"userId": "u"}"#).unwrap();

        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_directory_path_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(store.try_load_all().await, Err(CoreError::Io(_))));
        assert!(store.load_all().await.is_empty());
        assert!(logs_contain("Feedback store unreadable"));
    }

    #[tokio::test]
    async fn test_null_and_numeric_labels_score_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"[
                {"userId": "u", "feedback": "hot", "timestamp": 1},
                {"userId": "u", "feedback": null, "timestamp": 2},
                {"userId": "u", "feedback": 7, "timestamp": 3}
            ]"#,
        )
        .unwrap();

        let events = store.load_all().await;
        assert_eq!(events.len(), 3);

        // 0.6 -> 0.48 -> 0.384
        let estimator = OffsetEstimator::new(Arc::new(EstimatorConfig::default()));
        assert_eq!(estimator.estimate("u", &events), 0.38);
    }

    #[tokio::test]
    async fn test_unreadable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"[
                {"userId": "u", "feedback": "hot", "timestamp": 1},
                {"feedback": "cold"},
                42,
                {"userId": "u", "feedback": "cold", "timestamp": 2}
            ]"#,
        )
        .unwrap();

        let events = store.load_all().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].feedback, HOT);
        assert_eq!(events[1].feedback, COLD);
    }

    #[tokio::test]
    async fn test_append_creates_file_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("feedback_db.json"));

        store.append(FeedbackEvent::new("u", HOT, 1.0)).await.unwrap();
        store.append(FeedbackEvent::new("u", COLD, 2.0)).await.unwrap();

        let events = store.try_load_all().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].feedback, HOT);
        assert_eq!(events[1].feedback, COLD);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"userId\": \"u\""));
    }

    #[tokio::test]
    async fn test_append_keeps_undecodable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"[{"legacy": true}]"#).unwrap();

        store.append(FeedbackEvent::new("u", HOT, 1.0)).await.unwrap();

        let raw: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["legacy"], true);
    }

    #[tokio::test]
    async fn test_append_refuses_to_overwrite_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "garbage").unwrap();

        let result = store.append(FeedbackEvent::new("u", HOT, 1.0)).await;
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(FeedbackEvent::new(format!("user-{i}"), HOT, i as f64))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.try_load_all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryFeedbackStore::with_events(vec![FeedbackEvent::new("u", HOT, 1.0)]);
        store.append(FeedbackEvent::new("u", COLD, 2.0)).await.unwrap();

        let events = store.load_all().await;
        assert_eq!(events.len(), 2);
        assert!(MemoryFeedbackStore::new().load_all().await.is_empty());
    }
}
