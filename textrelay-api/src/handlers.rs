//! Handlers for the `/api` routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use textrelay_dispatch::{DispatchError, DispatchRequest, RelayCredential};
use textrelay_store::{ApiKey, RunArchive, SessionId, SessionRecord, StoreError};

use crate::{AppState, RequestError};

/// Reply to `POST /api/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub status: String,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failed_emails: Vec<String>,
    pub log_file: String,
}

/// Body of `POST /api/test-smtp`.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpTestRequest {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from: String,
}

impl From<SmtpTestRequest> for RelayCredential {
    fn from(request: SmtpTestRequest) -> Self {
        Self {
            host: request.host,
            port: request.port,
            username: request.username,
            secret: request.password,
            sender: request.from,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewApiKey {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub id: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RequestError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        RequestError::invalid_body()
    })
}

fn store_failure(context: &'static str) -> impl FnOnce(StoreError) -> RequestError {
    move |e| {
        tracing::error!(error = %e, "{context}");
        RequestError::internal(context)
    }
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, RequestError> {
    let request = body(payload)?;

    // Runs detached: a dropped request must not stop a run partway.
    tokio::spawn(run_and_record(state, request))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Dispatch task failed");
            RequestError::internal("Dispatch task failed")
        })?
        .map(Json)
}

/// Dispatches `request`, then records its sessions and archives the run.
async fn run_and_record(
    state: Arc<AppState>,
    request: DispatchRequest,
) -> Result<SendResponse, RequestError> {
    let report = state
        .dispatcher
        .dispatch(
            &request.message(),
            &request.carriers,
            &request.numbers,
            request.smtp_configs.clone(),
            &request.usage_limits,
        )
        .await
        .map_err(|e| match e {
            DispatchError::Configuration(reason) => RequestError::bad_request(reason),
        })?;

    if let Err(e) = state
        .store
        .record_sessions(&request.letter, &report.outcomes)
        .await
    {
        tracing::error!(error = %e, "Failed to record sessions");
    }

    let summary = report.summary;
    let archive = RunArchive::new(request, report.outcomes);
    let log_file = match state.store.archive_run(&archive).await {
        Ok(name) => name,
        Err(e) => {
            tracing::error!(error = %e, "Failed to archive run");
            archive.log_file_name()
        }
    };

    tracing::info!(
        total = summary.total,
        success = summary.success,
        failed = summary.failed,
        log_file = %log_file,
        "Dispatch run completed"
    );

    Ok(SendResponse {
        status: "completed".to_string(),
        total: summary.total,
        success: summary.success,
        failed: summary.failed,
        failed_emails: summary.failed_addresses,
        log_file,
    })
}

async fn probe(state: &AppState, relay: &RelayCredential) -> Response {
    match state.dispatcher.test_connection(relay).await {
        Ok(()) => {
            tracing::info!(host = %relay.host, port = relay.port, "SMTP test passed");
            (StatusCode::OK, "SMTP Test Passed").into_response()
        }
        Err(e) => {
            tracing::warn!(host = %relay.host, port = relay.port, error = %e, "SMTP test failed");
            RequestError::internal(format!("SMTP Test Failed: {e}")).into_response()
        }
    }
}

pub async fn test_smtp(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SmtpTestRequest>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(request) => probe(&state, &request.into()).await,
        Err(e) => e.into_response(),
    }
}

pub async fn test_smtp_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RelayCredential>, JsonRejection>,
) -> Response {
    match body(payload) {
        Ok(relay) => probe(&state, &relay).await,
        Err(e) => e.into_response(),
    }
}

pub async fn generate_api_key(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewApiKey>, JsonRejection>,
) -> Result<Json<ApiKey>, RequestError> {
    let request = body(payload)?;

    let key = state
        .store
        .insert_api_key(&request.name)
        .await
        .map_err(store_failure("DB insert failed"))?;

    tracing::info!(id = key.id, name = %key.name, "Issued API key");
    Ok(Json(key))
}

pub async fn list_api_keys(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ApiKey>>, RequestError> {
    state
        .store
        .api_keys()
        .await
        .map(Json)
        .map_err(store_failure("DB query error"))
}

pub async fn sms_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<SessionRecord>, RequestError> {
    let raw = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| RequestError::bad_request("Missing session id"))?;

    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| RequestError::bad_request("Invalid session id"))?;

    let not_found = || RequestError::new(StatusCode::NOT_FOUND, "Session not found");
    let id = u64::try_from(id).map(SessionId::new).map_err(|_| not_found())?;

    match state.store.session(id).await {
        Ok(record) => Ok(Json(record)),
        Err(StoreError::NotFound(_)) => Err(not_found()),
        Err(e) => Err(store_failure("DB query error")(e)),
    }
}
