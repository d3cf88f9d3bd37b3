//! Shared plumbing for the textrelay workspace: logging setup, the
//! `internal!`/`incoming!`/`outgoing!` trace macros, configuration file
//! discovery and the process-wide shutdown signal type.

pub mod config;
pub mod logging;

pub use tracing;

/// Lifecycle signal broadcast to long-running services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Finalised,
}
