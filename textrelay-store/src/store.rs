use async_trait::async_trait;
use textrelay_dispatch::DispatchOutcome;

use crate::{ApiKey, RunArchive, SessionId, SessionRecord, StoreError};

/// Sink for finished runs and issuer of API keys.
///
/// Implementations must be safe to share between request handlers; ids are
/// assigned under the implementation's own lock so concurrent runs never
/// reuse one.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Records one session per outcome, in order, returning the new ids.
    async fn record_sessions(
        &self,
        message: &str,
        outcomes: &[DispatchOutcome],
    ) -> Result<Vec<SessionId>, StoreError>;

    async fn session(&self, id: SessionId) -> Result<SessionRecord, StoreError>;

    /// Writes the run log and the redacted request, returning the log file
    /// name (without directory).
    async fn archive_run(&self, archive: &RunArchive) -> Result<String, StoreError>;

    async fn insert_api_key(&self, name: &str) -> Result<ApiKey, StoreError>;

    /// All keys in issue order.
    async fn api_keys(&self) -> Result<Vec<ApiKey>, StoreError>;
}
