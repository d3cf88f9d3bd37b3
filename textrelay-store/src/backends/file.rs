use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use textrelay_common::internal;
use textrelay_dispatch::DispatchOutcome;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use super::Ledger;
use crate::{ApiKey, RunArchive, SessionId, SessionRecord, SessionStore, StoreError};

const SESSIONS_FILE: &str = "sessions.jsonl";
const API_KEYS_FILE: &str = "api_keys.jsonl";
const LOG_DIR: &str = "logs";
const REQUEST_DIR: &str = "sessions";

const SENSITIVE_PREFIXES: [&str; 9] = [
    "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
];

/// Store rooted at one directory:
///
/// ```text
/// <path>/sessions.jsonl        one SessionRecord per line
/// <path>/api_keys.jsonl        one ApiKey per line
/// <path>/logs/session_<t>.txt  plain-text run logs
/// <path>/sessions/session_<t>.json  redacted requests
/// ```
///
/// Both ledgers are append-only and replayed into memory on open. Archive
/// files are written to a `.tmp_` name first and renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    ledger: Arc<Mutex<Ledger>>,
}

impl FileStore {
    /// Checks that `path` is usable as a store root.
    ///
    /// Rejects `..` components and well-known system directories. Relative
    /// paths are allowed and resolve against the working directory.
    pub fn validate_path(path: &Path) -> Result<(), StoreError> {
        if path.as_os_str().is_empty() {
            return Err(StoreError::Validation("Store path cannot be empty".to_string()));
        }

        if path.components().any(|c| c == Component::ParentDir) {
            return Err(StoreError::Validation(format!(
                "Store path cannot contain '..' components: {}",
                path.display()
            )));
        }

        if let Some(prefix) = SENSITIVE_PREFIXES
            .iter()
            .find(|prefix| path.starts_with(prefix))
        {
            return Err(StoreError::Validation(format!(
                "Store path cannot be in system directory {prefix}: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Opens (creating if needed) the store at `path` and replays its ledgers.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        Self::validate_path(&path)?;

        if fs::try_exists(&path).await? {
            if !fs::metadata(&path).await?.is_dir() {
                return Err(StoreError::Validation(format!(
                    "Expected {} to be a directory",
                    path.display()
                )));
            }
        } else {
            internal!("{} does not exist, creating...", path.display());
        }

        fs::create_dir_all(path.join(LOG_DIR)).await?;
        fs::create_dir_all(path.join(REQUEST_DIR)).await?;

        let mut ledger = Ledger::default();
        for record in replay::<SessionRecord>(&path.join(SESSIONS_FILE)).await? {
            ledger.push_session(record);
        }
        for key in replay::<ApiKey>(&path.join(API_KEYS_FILE)).await? {
            ledger.push_key(key);
        }

        internal!(
            level = INFO,
            "Opened store at {} with {} sessions and {} API keys",
            path.display(),
            ledger.session_count(),
            ledger.keys().len()
        );

        Ok(Self {
            path,
            ledger: Arc::new(Mutex::new(ledger)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_path(&self, name: &str) -> PathBuf {
        self.path.join(LOG_DIR).join(name)
    }

    pub fn request_path(&self, name: &str) -> PathBuf {
        self.path.join(REQUEST_DIR).join(name)
    }
}

/// Writes `contents` next to `target` under a `.tmp_` name, then renames.
async fn write_atomically(target: &Path, contents: String) -> Result<(), StoreError> {
    let Some(name) = target.file_name() else {
        return Err(StoreError::Validation(format!(
            "No file name in {}",
            target.display()
        )));
    };
    let temp = target.with_file_name(format!(".tmp_{}", name.to_string_lossy()));

    fs::write(&temp, contents).await?;
    fs::rename(&temp, target).await?;
    Ok(())
}

/// Reads every JSON line of `path`; a missing file is an empty ledger.
async fn replay<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect()
}

async fn append<T: Serialize>(path: &Path, entries: &[T]) -> Result<(), StoreError> {
    let mut buffer = String::new();
    for entry in entries {
        buffer.push_str(&serde_json::to_string(entry)?);
        buffer.push('\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(buffer.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileStore {
    #[tracing::instrument(level = "debug", skip(self, message, outcomes), fields(count = outcomes.len()))]
    async fn record_sessions(
        &self,
        message: &str,
        outcomes: &[DispatchOutcome],
    ) -> Result<Vec<SessionId>, StoreError> {
        let mut ledger = self.ledger.lock().await;
        let records = ledger.draft_sessions(message, outcomes, Utc::now());

        // Nothing is visible until the lines are on disk.
        append(&self.path.join(SESSIONS_FILE), &records).await?;

        let ids = records.iter().map(|record| record.id).collect();
        for record in records {
            ledger.push_session(record);
        }

        Ok(ids)
    }

    async fn session(&self, id: SessionId) -> Result<SessionRecord, StoreError> {
        self.ledger
            .lock()
            .await
            .session(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn archive_run(&self, archive: &RunArchive) -> Result<String, StoreError> {
        let name = archive.log_file_name();

        write_atomically(&self.log_path(&name), archive.render_log()).await?;
        write_atomically(
            &self.request_path(&archive.request_file_name()),
            archive.render_request()?,
        )
        .await?;

        internal!(level = DEBUG, "Archived run to {}", self.log_path(&name).display());
        Ok(name)
    }

    async fn insert_api_key(&self, name: &str) -> Result<ApiKey, StoreError> {
        let mut ledger = self.ledger.lock().await;
        let key = ledger.draft_key(name, Utc::now());

        append(&self.path.join(API_KEYS_FILE), std::slice::from_ref(&key)).await?;
        ledger.push_key(key.clone());

        Ok(key)
    }

    async fn api_keys(&self) -> Result<Vec<ApiKey>, StoreError> {
        Ok(self.ledger.lock().await.keys().to_vec())
    }
}
