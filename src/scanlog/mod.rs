//! Scan Log
//!
//! Append-only, most-recent-first record of batch outcomes. Entries are
//! created Pending when a batch is dispatched and settled in place once the
//! remote call resolves; they are never deleted. The store is shared behind
//! a lock so a detached OCR worker can still settle its entry after the
//! scanning session has stopped.

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Log store handle shared between the pipeline and OCR workers
pub type SharedLogStore = Arc<RwLock<LogStore>>;

/// Terminal state of a batch dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    /// Dispatch in flight, result not yet known
    Pending,
    /// Remote extraction succeeded
    Success,
    /// Remote extraction failed; the entry text carries the message
    Error,
}

/// One batch outcome in the scan log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// Dispatch timestamp in unix milliseconds
    pub timestamp_ms: u64,
    /// JPEG thumbnail, the sharpest frame of the batch
    pub thumbnail: Vec<u8>,
    /// Batch status
    pub status: LogStatus,
    /// Extracted text, placeholder while pending, error message on failure
    pub text: String,
    /// Best-effort structured payload decoded from the response
    pub payload: Option<Value>,
}

/// Append-only batch outcome log, most recent first.
#[derive(Debug, Default)]
pub struct LogStore {
    entries: Vec<LogEntry>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared store handle
    pub fn shared() -> SharedLogStore {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Append a Pending entry for a freshly dispatched batch and return
    /// its identifier.
    pub fn push_pending(&mut self, thumbnail: Vec<u8>, timestamp_ms: u64) -> Uuid {
        let entry = LogEntry {
            id: Uuid::new_v4(),
            timestamp_ms,
            thumbnail,
            status: LogStatus::Pending,
            text: "Analyzing frames...".to_string(),
            payload: None,
        };
        let id = entry.id;
        self.entries.insert(0, entry);
        id
    }

    /// Settle a pending entry as successful
    pub fn settle_success(&mut self, id: Uuid, text: String, payload: Option<Value>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.status = LogStatus::Success;
            entry.text = text;
            entry.payload = payload;
        }
    }

    /// Settle a pending entry as failed, recording the failure message
    pub fn settle_error(&mut self, id: Uuid, message: String) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.status = LogStatus::Error;
            entry.text = message;
        }
    }

    /// All entries, most recent first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_are_most_recent_first() {
        let mut store = LogStore::new();
        let first = store.push_pending(vec![1], 1_000);
        let second = store.push_pending(vec![2], 2_000);

        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].id, second);
        assert_eq!(store.entries()[1].id, first);
    }

    #[test]
    fn test_pending_entry_has_placeholder_text() {
        let mut store = LogStore::new();
        store.push_pending(vec![1], 1_000);

        let entry = &store.entries()[0];
        assert_eq!(entry.status, LogStatus::Pending);
        assert_eq!(entry.text, "Analyzing frames...");
        assert!(entry.payload.is_none());
    }

    #[test]
    fn test_settle_success_mutates_in_place() {
        let mut store = LogStore::new();
        let id = store.push_pending(vec![1], 1_000);
        store.settle_success(id, "ABC123".to_string(), Some(json!({"full_text": "ABC123"})));

        assert_eq!(store.len(), 1);
        let entry = &store.entries()[0];
        assert_eq!(entry.status, LogStatus::Success);
        assert_eq!(entry.text, "ABC123");
        assert_eq!(entry.payload, Some(json!({"full_text": "ABC123"})));
    }

    #[test]
    fn test_settle_error_records_message() {
        let mut store = LogStore::new();
        let id = store.push_pending(vec![1], 1_000);
        store.settle_error(id, "API key is missing".to_string());

        let entry = &store.entries()[0];
        assert_eq!(entry.status, LogStatus::Error);
        assert_eq!(entry.text, "API key is missing");
    }

    #[test]
    fn test_settle_unknown_id_is_a_no_op() {
        let mut store = LogStore::new();
        store.push_pending(vec![1], 1_000);
        store.settle_error(Uuid::new_v4(), "lost".to_string());

        assert_eq!(store.entries()[0].status, LogStatus::Pending);
    }
}
