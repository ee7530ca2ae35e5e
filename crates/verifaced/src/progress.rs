//! Per-session verification progress tracking.
//!
//! Process-wide shared state keyed by session id, written by the engine and
//! read by the SSE responder. Updates replace the whole record under one
//! lock acquisition, so an observer never sees a partially written record.
//! Sessions are independent; a record's absence means "finished or
//! unknown", never an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Progress snapshot for one in-flight verification.
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    /// 0–100; the engine only moves this forward within a session.
    pub percent: u8,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

/// Sink the engine emits progress milestones into. Injected so tests can
/// record the milestone sequence without a store.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, session_id: &str, percent: u8, message: &str);
}

/// Concurrency-safe in-memory progress store.
#[derive(Clone, Default)]
pub struct ProgressStore {
    inner: Arc<RwLock<HashMap<String, ProgressRecord>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for a session, if the session is still active.
    pub async fn get(&self, session_id: &str) -> Option<ProgressRecord> {
        self.inner.read().await.get(session_id).cloned()
    }

    /// Delete a session's record. Called by the progress responder once the
    /// terminal event has been delivered.
    pub async fn remove(&self, session_id: &str) {
        self.inner.write().await.remove(session_id);
    }
}

#[async_trait]
impl ProgressSink for ProgressStore {
    async fn update(&self, session_id: &str, percent: u8, message: &str) {
        let record = ProgressRecord {
            percent,
            message: message.to_string(),
            updated_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .insert(session_id.to_string(), record);
    }
}
