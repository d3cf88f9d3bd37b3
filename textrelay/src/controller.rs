use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use serde::Deserialize;
use textrelay_api::{ApiConfig, ApiServer, AppState};
use textrelay_common::{Signal, config, internal, logging};
use textrelay_dispatch::{CarrierDirectory, DispatchSettings, Dispatcher, SmtpTransport};
use textrelay_store::StoreConfig;
use tokio::sync::broadcast;

/// Environment variable naming the config file.
pub const CONFIG_VAR: &str = "TEXTRELAY_CONFIG";

/// Fallback config locations, in order.
pub fn default_config_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./textrelay.config.ron"),
        PathBuf::from("/etc/textrelay/textrelay.config.ron"),
    ]
}

/// Where the carrier gateway table lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CarriersConfig {
    #[serde(default = "default_carriers_path")]
    pub path: PathBuf,
}

fn default_carriers_path() -> PathBuf {
    PathBuf::from("carriers.json")
}

impl Default for CarriersConfig {
    fn default() -> Self {
        Self {
            path: default_carriers_path(),
        }
    }
}

/// The whole service, as read from `textrelay.config.ron`.
#[derive(Debug, Default, Deserialize)]
pub struct Textrelay {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub carriers: CarriersConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Builds a dispatcher over real SMTP from a carrier table on disk.
pub fn build_dispatcher(
    carriers: &Path,
    settings: DispatchSettings,
) -> anyhow::Result<Dispatcher> {
    let directory = CarrierDirectory::load(carriers)?;
    internal!(
        level = INFO,
        "Loaded {} carrier gateways from {}",
        directory.len(),
        carriers.display()
    );

    let transport = SmtpTransport::from_settings(&settings);
    Ok(Dispatcher::new(Arc::new(directory), Arc::new(transport), settings))
}

#[tracing::instrument(level = "trace")]
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered, shutting down");
        }
        _ = terminate.recv() => {
            internal!("Terminate Signal received, shutting down");
        }
    };

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    Ok(())
}

impl Textrelay {
    /// Locate and parse the config file.
    pub fn load() -> anyhow::Result<Self> {
        let path = config::find_config_file(CONFIG_VAR, &default_config_paths())?;
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = config::read_config(path)?;
        ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))
    }

    /// Run the service until SIGINT or SIGTERM.
    #[tracing::instrument(level = "trace", skip_all, err)]
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();

        let dispatcher = build_dispatcher(&self.carriers.path, self.dispatch)?;
        let store = self.store.open().await?;
        internal!(level = INFO, "Store ready: {:?}", self.store.path());

        let server = ApiServer::new(&self.api, AppState::new(dispatcher, store)).await?;

        internal!("Controller running");

        let ret = tokio::select! {
            r = server.serve(SHUTDOWN_BROADCAST.subscribe()) => {
                r.map_err(anyhow::Error::from)
            }
            r = shutdown() => {
                r
            }
        };

        internal!("Shutting down...");

        ret
    }
}
