//! Multi-asset add: one concurrent store call per submitted asset.
//!
//! All sub-tasks share the batch's [`OpContext`]; one item failing never
//! cancels its siblings. Store access is gated by the shared batch semaphore
//! so a large payload queues instead of exhausting the connection pool.
//!
//! Exactly one response is written after every sub-task has finished:
//! - no failures: `201 Created`
//! - otherwise the first failure in submission order picks the status
//!   (`504` for a deadline or cancellation, `500` for anything else) and the
//!   body lists every failure as `<asset id>: <message>`, in submission order.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info};

use super::favorites::{decode_body, finish, store_asset};
use crate::{
    context::OpContext,
    error::{text_error, AppResult, StoreError, StoreResult},
    retry::RetryPolicy,
    state::AppState,
    store::Store,
    types::{Asset, AssetError},
};

pub async fn add_multiple_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Response {
    state.metrics.inc_requests();
    let result = add_batch(&state, user_id, &body).await;
    finish(&state, result)
}

async fn add_batch(state: &AppState, user_id: String, body: &[u8]) -> AppResult<Response> {
    let assets: Vec<Asset> = decode_body(body)?;
    let ctx = OpContext::with_timeout(state.config.handlers.write_timeout());
    let _cancel_on_drop = ctx.drop_guard();
    info!(user_id = %user_id, count = assets.len(), "POST request received to add multiple assets");

    let submitted = assets.len() as u64;
    state.metrics.add_batch_items(submitted);
    let failures = fan_out(
        state.store.clone(),
        &ctx,
        &state.retry,
        state.batch_permits.clone(),
        Arc::from(user_id),
        assets,
    )
    .await;

    state.metrics.add_assets_added(submitted - failures.len() as u64);
    if failures.is_empty() {
        return Ok(StatusCode::CREATED.into_response());
    }
    Ok(failure_response(state, &failures))
}

/// Adds every asset concurrently and returns the failures in submission order.
pub async fn fan_out(
    store: Arc<dyn Store>,
    ctx: &OpContext,
    policy: &RetryPolicy,
    permits: Arc<Semaphore>,
    user_id: Arc<str>,
    assets: Vec<Asset>,
) -> Vec<AssetError> {
    let mut tasks = JoinSet::new();
    for (index, asset) in assets.iter().cloned().enumerate() {
        let store = store.clone();
        let ctx = ctx.clone();
        let policy = policy.clone();
        let permits = permits.clone();
        let user_id = user_id.clone();
        info!(asset_id = %asset.id, asset_type = %asset.asset_type, "Asset to be added");
        tasks.spawn(async move {
            let res = add_with_permit(store.as_ref(), &ctx, &policy, &permits, &user_id, &asset).await;
            (index, res)
        });
    }

    let mut outcomes: Vec<Option<StoreResult<()>>> = assets.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, res)) => outcomes[index] = Some(res),
            Err(e) => error!("Batch add task did not complete: {}", e),
        }
    }

    assets
        .into_iter()
        .zip(outcomes)
        .filter_map(|(asset, outcome)| {
            let error = match outcome {
                Some(Ok(())) => return None,
                Some(Err(e)) => e,
                None => StoreError::Other("add task aborted".to_string()),
            };
            if error.is_cancellation() {
                error!(asset_id = %asset.id, "Request timed out for asset: {}", error);
            } else {
                error!(asset_id = %asset.id, "Error on executing the query for asset: {}", error);
            }
            Some(AssetError { asset, error })
        })
        .collect()
}

async fn add_with_permit(
    store: &dyn Store,
    ctx: &OpContext,
    policy: &RetryPolicy,
    permits: &Semaphore,
    user_id: &str,
    asset: &Asset,
) -> StoreResult<()> {
    let _permit = tokio::select! {
        err = ctx.done() => return Err(err),
        permit = permits.acquire() => {
            permit.map_err(|_| StoreError::Other("batch limiter closed".to_string()))?
        }
    };
    store_asset(store, ctx, policy, user_id, asset).await
}

fn failure_response(state: &AppState, failures: &[AssetError]) -> Response {
    let timed_out = failures[0].error.is_cancellation();
    let status = if timed_out { StatusCode::GATEWAY_TIMEOUT } else { StatusCode::INTERNAL_SERVER_ERROR };
    if timed_out {
        state.metrics.inc_timeouts();
    } else {
        state.metrics.inc_store_failures();
    }

    let message = failures
        .iter()
        .map(|f| {
            let reason =
                if f.error.is_cancellation() { "Request timed out".to_string() } else { f.error.to_string() };
            format!("{}: {}", f.asset.id, reason)
        })
        .collect::<Vec<_>>()
        .join("\n");
    text_error(status, &message)
}
