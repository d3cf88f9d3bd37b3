use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use textrelay_dispatch::DispatchOutcome;
use tokio::sync::RwLock;

use super::Ledger;
use crate::{ApiKey, RunArchive, SessionId, SessionRecord, SessionStore, StoreError};

/// Store that keeps records, keys and archives in process memory.
///
/// Nothing survives a restart. Archived runs stay readable through
/// [`MemoryStore::log`] and [`MemoryStore::archived_request`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    ledger: Arc<RwLock<Ledger>>,
    archives: Arc<RwLock<HashMap<String, ArchivedRun>>>,
}

#[derive(Debug, Clone)]
struct ArchivedRun {
    log: String,
    request: String,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.ledger.read().await.session_count()
    }

    /// Contents of an archived run log, by the name `archive_run` returned.
    pub async fn log(&self, name: &str) -> Option<String> {
        self.archives.read().await.get(name).map(|run| run.log.clone())
    }

    /// Redacted request JSON stored alongside the log `name`.
    pub async fn archived_request(&self, name: &str) -> Option<String> {
        self.archives
            .read()
            .await
            .get(name)
            .map(|run| run.request.clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn record_sessions(
        &self,
        message: &str,
        outcomes: &[DispatchOutcome],
    ) -> Result<Vec<SessionId>, StoreError> {
        let mut ledger = self.ledger.write().await;
        let records = ledger.draft_sessions(message, outcomes, Utc::now());
        let ids = records.iter().map(|record| record.id).collect();

        for record in records {
            ledger.push_session(record);
        }

        Ok(ids)
    }

    async fn session(&self, id: SessionId) -> Result<SessionRecord, StoreError> {
        self.ledger
            .read()
            .await
            .session(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn archive_run(&self, archive: &RunArchive) -> Result<String, StoreError> {
        let name = archive.log_file_name();
        let run = ArchivedRun {
            log: archive.render_log(),
            request: archive.render_request()?,
        };

        self.archives.write().await.insert(name.clone(), run);
        Ok(name)
    }

    async fn insert_api_key(&self, name: &str) -> Result<ApiKey, StoreError> {
        let mut ledger = self.ledger.write().await;
        let key = ledger.draft_key(name, Utc::now());
        ledger.push_key(key.clone());
        Ok(key)
    }

    async fn api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        Ok(self.ledger.read().await.keys().to_vec())
    }
}
