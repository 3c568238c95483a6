use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    context::OpContext,
    error::{AppError, AppResult, StoreResult},
    retry::{self, RetryPolicy},
    state::AppState,
    store::Store,
    types::{Asset, AssetType, FavoritesQuery, Pagination, UpdateDescriptionRequest},
};

/// Converts a handler outcome into the response, counting failures.
pub(crate) fn finish(state: &AppState, result: AppResult<Response>) -> Response {
    match result {
        Ok(res) => res,
        Err(e) => {
            state.metrics.record_error(&e);
            e.into_response()
        }
    }
}

/// Decodes a JSON request body; any decode failure is a bad request.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Invalid request payload: {}", e);
        AppError::invalid_payload()
    })
}

/// The single-add path shared by the add and batch handlers.
pub(crate) async fn store_asset(
    store: &dyn Store,
    ctx: &OpContext,
    policy: &RetryPolicy,
    user_id: &str,
    asset: &Asset,
) -> StoreResult<()> {
    retry::execute(ctx, policy, || store.add_favorite(ctx, user_id, asset)).await
}

pub async fn get_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    state.metrics.inc_requests();
    let query = FavoritesQuery::from_pairs(&pairs);
    let result = list_favorites(&state, &user_id, query).await;
    finish(&state, result)
}

async fn list_favorites(state: &AppState, user_id: &str, query: FavoritesQuery) -> AppResult<Response> {
    let ctx = OpContext::with_timeout(state.config.handlers.read_timeout());
    let _cancel_on_drop = ctx.drop_guard();

    let filter = match query.asset_type.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(AssetType::parse_filter(raw).ok_or_else(AppError::invalid_asset_type)?),
    };
    let page = Pagination::from_query(query.page.as_deref(), query.page_size.as_deref());
    info!(
        user_id,
        filter = ?filter,
        page = page.page,
        page_size = page.page_size,
        "GET request received for favorites"
    );

    let store = state.store.as_ref();
    let assets = retry::execute(&ctx, &state.retry, || {
        store.fetch_favorites(&ctx, user_id, filter.clone(), page)
    })
    .await?;

    let body = serde_json::to_vec(&assets).map_err(|e| AppError::Internal(e.into()))?;
    let mut res = (StatusCode::OK, body).into_response();
    res.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(res)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Response {
    state.metrics.inc_requests();
    let result = add_single(&state, &user_id, &body).await;
    finish(&state, result)
}

async fn add_single(state: &AppState, user_id: &str, body: &[u8]) -> AppResult<Response> {
    let asset: Asset = decode_body(body)?;
    let ctx = OpContext::with_timeout(state.config.handlers.write_timeout());
    let _cancel_on_drop = ctx.drop_guard();
    info!(
        user_id,
        asset_id = %asset.id,
        asset_type = %asset.asset_type,
        "POST request received to add a single asset"
    );

    store_asset(state.store.as_ref(), &ctx, &state.retry, user_id, &asset).await?;
    state.metrics.add_assets_added(1);
    Ok(StatusCode::CREATED.into_response())
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((user_id, asset_id)): Path<(String, String)>,
) -> Response {
    state.metrics.inc_requests();
    let result = remove(&state, &user_id, &asset_id).await;
    finish(&state, result)
}

async fn remove(state: &AppState, user_id: &str, asset_id: &str) -> AppResult<Response> {
    let ctx = OpContext::with_timeout(state.config.handlers.read_timeout());
    let _cancel_on_drop = ctx.drop_guard();
    info!(user_id, asset_id, "DELETE request received");

    let store = state.store.as_ref();
    retry::execute(&ctx, &state.retry, || store.remove_favorite(&ctx, user_id, asset_id)).await?;
    state.metrics.inc_assets_removed();
    Ok(StatusCode::OK.into_response())
}

pub async fn update_description(
    State(state): State<AppState>,
    Path((user_id, asset_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    state.metrics.inc_requests();
    let result = edit_description(&state, &user_id, &asset_id, &body).await;
    finish(&state, result)
}

async fn edit_description(state: &AppState, user_id: &str, asset_id: &str, body: &[u8]) -> AppResult<Response> {
    let req: UpdateDescriptionRequest = decode_body(body)?;
    let ctx = OpContext::with_timeout(state.config.handlers.write_timeout());
    let _cancel_on_drop = ctx.drop_guard();
    info!(user_id, asset_id, description = %req.description, "PUT request received");

    let store = state.store.as_ref();
    retry::execute(&ctx, &state.retry, || {
        store.update_description(&ctx, user_id, asset_id, &req.description)
    })
    .await?;
    state.metrics.inc_descriptions_updated();
    Ok(StatusCode::OK.into_response())
}
