//! HTTP surface of textrelay.
//!
//! # Endpoints
//!
//! - **`POST /api/send`** - dispatch a run, persist it, reply with the summary
//! - **`POST /api/test-smtp`**, **`POST /api/test-smtp-config`** - relay connection test
//! - **`POST /api/generate-api-key`**, **`GET /api/keys`** - API keys
//! - **`GET /api/sms-status?id=N`** - one session record
//! - everything else is served from the public directory
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use textrelay_api::{ApiConfig, ApiServer, AppState};
//! use textrelay_dispatch::{CarrierDirectory, DispatchSettings, Dispatcher, SmtpTransport};
//! use textrelay_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = DispatchSettings::default();
//! let transport = SmtpTransport::from_settings(&settings);
//! let dispatcher = Dispatcher::new(
//!     Arc::new(CarrierDirectory::default()),
//!     Arc::new(transport),
//!     settings,
//! );
//!
//! let state = AppState::new(dispatcher, Arc::new(MemoryStore::new()));
//! let server = ApiServer::new(&ApiConfig::default(), state).await?;
//! // server.serve(shutdown_receiver).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod handlers;
mod server;
mod state;

pub use config::ApiConfig;
pub use error::{ApiError, RequestError};
pub use handlers::{SendResponse, SmtpTestRequest};
pub use server::{ApiServer, router};
pub use state::AppState;
