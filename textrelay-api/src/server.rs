//! API HTTP server

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use textrelay_common::Signal;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, timeout::TimeoutLayer};

use crate::{ApiConfig, ApiError, AppState, handlers};

/// Builds the full application: `/api` routes plus static files from
/// `config.public_dir` for everything else.
///
/// `config.request_timeout_secs` bounds every route except `/api/send`, whose
/// runs are bounded by the relays' own timeouts.
pub fn router(config: &ApiConfig, state: Arc<AppState>) -> Router {
    let timed = Router::new()
        .route("/api/test-smtp", post(handlers::test_smtp))
        .route("/api/test-smtp-config", post(handlers::test_smtp_config))
        .route("/api/generate-api-key", post(handlers::generate_api_key))
        .route("/api/keys", get(handlers::list_api_keys))
        .route("/api/sms-status", get(handlers::sms_status))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(ServiceBuilder::new().layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        )));

    Router::new()
        .route("/api/send", post(handlers::send))
        .merge(timed)
        .with_state(state)
}

pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    /// Binds `config.listen_address`.
    pub async fn new(config: &ApiConfig, state: Arc<AppState>) -> Result<Self, ApiError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|e| ApiError::BindError {
                address: config.listen_address.clone(),
                source: e,
            })?;

        tracing::info!(
            address = %config.listen_address,
            public_dir = %config.public_dir.display(),
            "API server bound"
        );

        Ok(Self {
            listener,
            router: router(config, state),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until a signal arrives on `shutdown`, then drains open requests.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), ApiError> {
        tracing::info!("API server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("API server received shutdown signal");
            })
            .await
            .map_err(|e| ApiError::ServerError(e.to_string()))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}
