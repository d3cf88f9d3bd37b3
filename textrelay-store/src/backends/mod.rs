//! Store backends:
//! - `memory`: everything in process memory, for tests and throwaway runs
//! - `file`: JSON-lines ledgers plus archive files under one directory

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use textrelay_dispatch::DispatchOutcome;

use crate::{ApiKey, SessionId, SessionRecord, generate_key};

/// Records and keys shared by both backends, with id assignment.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    sessions: Vec<SessionRecord>,
    keys: Vec<ApiKey>,
}

impl Ledger {
    fn next_session_id(&self) -> u64 {
        self.sessions.last().map_or(1, |record| record.id.get() + 1)
    }

    fn next_key_id(&self) -> u64 {
        self.keys.last().map_or(1, |key| key.id + 1)
    }

    /// Builds the records for `outcomes` without storing them.
    pub(crate) fn draft_sessions(
        &self,
        message: &str,
        outcomes: &[DispatchOutcome],
        timestamp: DateTime<Utc>,
    ) -> Vec<SessionRecord> {
        let first = self.next_session_id();

        outcomes
            .iter()
            .zip(first..)
            .map(|(outcome, id)| SessionRecord {
                id: SessionId::new(id),
                phone: outcome.target.clone(),
                relay: outcome.relay_host.clone(),
                status: outcome.status,
                message: message.to_string(),
                timestamp,
            })
            .collect()
    }

    pub(crate) fn draft_key(&self, name: &str, created_at: DateTime<Utc>) -> ApiKey {
        ApiKey {
            id: self.next_key_id(),
            name: name.to_string(),
            key: generate_key(),
            created_at,
        }
    }

    pub(crate) fn push_session(&mut self, record: SessionRecord) {
        self.sessions.push(record);
    }

    pub(crate) fn push_key(&mut self, key: ApiKey) {
        self.keys.push(key);
    }

    pub(crate) fn session(&self, id: SessionId) -> Option<&SessionRecord> {
        // Ids are assigned in order, so the vector is sorted by id.
        self.sessions
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .map(|index| &self.sessions[index])
    }

    pub(crate) fn keys(&self) -> &[ApiKey] {
        &self.keys
    }

    pub(crate) const fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
