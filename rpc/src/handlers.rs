//! Request handlers.
//!
//! Engine calls block on the chain client, so each one runs on the blocking
//! pool rather than on a runtime worker.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chainwatch_engine::{EngineError, EngineMetrics, TransactionDiscovery};
use chainwatch_types::{Address, Transaction};
use serde::Serialize;

use crate::RpcError;

#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<dyn TransactionDiscovery>,
    /// `None` disables `/metrics`.
    pub metrics: Option<Arc<EngineMetrics>>,
}

impl AppState {
    pub fn new(discovery: Arc<dyn TransactionDiscovery>) -> Self {
        Self {
            discovery,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentBlockResponse {
    pub current_block: u64,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub is_ok: bool,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

fn parse_address(raw: &str) -> Result<Address, RpcError> {
    Address::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, RpcError>
where
    T: Send + 'static,
    F: FnOnce(&dyn TransactionDiscovery) -> Result<T, EngineError> + Send + 'static,
{
    let discovery = Arc::clone(&state.discovery);
    let result = tokio::task::spawn_blocking(move || op(discovery.as_ref()))
        .await
        .map_err(|e| RpcError::Server(format!("engine task failed: {e}")))?;
    Ok(result?)
}

pub async fn get_current_block(
    State(state): State<AppState>,
) -> Result<Json<CurrentBlockResponse>, RpcError> {
    let current_block = run_blocking(&state, |d| d.current_block()).await?;
    Ok(Json(CurrentBlockResponse { current_block }))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<SubscribeResponse>, RpcError> {
    let address = parse_address(&raw)?;
    run_blocking(&state, move |d| d.subscribe(&address)).await?;
    Ok(Json(SubscribeResponse { is_ok: true }))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<TransactionsResponse>, RpcError> {
    let address = parse_address(&raw)?;
    let transactions = run_blocking(&state, move |d| d.transactions(&address)).await?;
    Ok(Json(TransactionsResponse { transactions }))
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let metrics = state.metrics.as_ref().ok_or(RpcError::MetricsDisabled)?;
    let body = metrics
        .render()
        .map_err(|e| RpcError::Server(format!("failed to encode metrics: {e}")))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
