use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Deserializer};

use crate::{FileStore, MemoryStore, SessionStore, StoreError};

/// Which store backs the service.
///
/// File-backed store in RON config:
/// ```ron
/// Textrelay (
///     store: File(
///         path: "/var/lib/textrelay",
///     ),
/// )
/// ```
///
/// Memory store, lost on restart:
/// ```ron
/// Textrelay (
///     store: Memory,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum StoreConfig {
    File {
        /// Store root; `..` components and system directories are rejected.
        #[serde(deserialize_with = "validated_path")]
        path: PathBuf,
    },
    Memory,
}

fn validated_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let path = PathBuf::deserialize(deserializer)?;
    FileStore::validate_path(&path).map_err(serde::de::Error::custom)?;
    Ok(path)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from("/var/lib/textrelay"),
        }
    }
}

impl StoreConfig {
    /// Directory of a file store, `None` for memory.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path } => Some(path.as_path()),
            Self::Memory => None,
        }
    }

    /// Opens the configured store as a shared trait object.
    pub async fn open(&self) -> Result<Arc<dyn SessionStore>, StoreError> {
        let store: Arc<dyn SessionStore> = match self {
            Self::File { path } => Arc::new(FileStore::open(path.clone()).await?),
            Self::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}
