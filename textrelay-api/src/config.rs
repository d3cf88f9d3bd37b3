//! HTTP API configuration

use std::path::PathBuf;

use serde::Deserialize;

/// The `api` section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Address to bind, e.g. `[::]:3000` or `127.0.0.1:3000`.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Directory served for every path outside `/api`.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Upper bound on a request. Dispatch runs are exempt.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_listen_address() -> String {
    "[::]:3000".to_string()
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

const fn default_request_timeout() -> u64 {
    600
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            public_dir: default_public_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}
