use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use textrelay_dispatch::{DispatchOutcome, DispatchRequest, OutcomeStatus};

/// Identifier of a stored session record. Ids start at 1 and only grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One gateway address of one run, as shown by `GET /api/sms-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    /// Gateway address the message went to.
    pub phone: String,
    /// Relay host, absent when the pool was exhausted.
    #[serde(rename = "smtp")]
    pub relay: Option<String>,
    pub status: OutcomeStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// An issued API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: u64,
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

/// Generates a key of the form `APIKEY-<non-negative i64>`.
pub fn generate_key() -> String {
    use rand::Rng;

    format!("APIKEY-{}", rand::rng().random_range(0..=i64::MAX))
}

/// A finished run as handed to [`crate::SessionStore::archive_run`].
#[derive(Debug, Clone)]
pub struct RunArchive {
    pub request: DispatchRequest,
    pub outcomes: Vec<DispatchOutcome>,
    pub finished_at: DateTime<Utc>,
}

impl RunArchive {
    pub fn new(request: DispatchRequest, outcomes: Vec<DispatchOutcome>) -> Self {
        Self {
            request,
            outcomes,
            finished_at: Utc::now(),
        }
    }

    /// `session_<unix seconds>.txt`
    pub fn log_file_name(&self) -> String {
        format!("session_{}.txt", self.finished_at.timestamp())
    }

    /// `session_<unix seconds>.json`
    pub fn request_file_name(&self) -> String {
        format!("session_{}.json", self.finished_at.timestamp())
    }

    /// Plain-text run log, one line per outcome in run order.
    pub fn render_log(&self) -> String {
        self.outcomes
            .iter()
            .map(log_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Pretty JSON of the request with secrets redacted.
    pub fn render_request(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.request.redacted())
    }
}

fn log_line(outcome: &DispatchOutcome) -> String {
    match (&outcome.relay_host, outcome.status) {
        (Some(host), OutcomeStatus::Sent | OutcomeStatus::Failed) => {
            format!("To: {} via {host} - {}", outcome.target, outcome.status)
        }
        _ => format!(
            "To: {} - no available SMTP servers (all usage limits exceeded)",
            outcome.target
        ),
    }
}
