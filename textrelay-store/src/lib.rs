//! Persistence for textrelay: per-address session records, archived run
//! logs with their (redacted) requests, and issued API keys.

pub mod backends;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use backends::{FileStore, MemoryStore};
pub use config::StoreConfig;
pub use error::StoreError;
pub use store::SessionStore;
pub use types::{ApiKey, RunArchive, SessionId, SessionRecord, generate_key};
