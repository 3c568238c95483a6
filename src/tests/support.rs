//! Shared fixtures: an in-process store with scripted answers and helpers
//! for driving the router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::{
    config::{AppConfig, RetryConfig},
    context::OpContext,
    error::{StoreError, StoreResult},
    routes,
    state::AppState,
    store::Store,
    types::{Asset, AssetType, Pagination},
};

type FetchFn = dyn Fn(&str, Option<&AssetType>, Pagination) -> StoreResult<Vec<Asset>> + Send + Sync;
type AddFn = dyn Fn(&Asset) -> StoreResult<()> + Send + Sync;
type RemoveFn = dyn Fn(&str) -> StoreResult<()> + Send + Sync;
type UpdateFn = dyn Fn(&str, &str) -> StoreResult<()> + Send + Sync;

#[derive(Default)]
pub struct Calls {
    pub fetch: AtomicUsize,
    pub add: AtomicUsize,
    pub remove: AtomicUsize,
    pub update: AtomicUsize,
}

/// A [`Store`] whose answers are closures, with call counters and an
/// optional per-call delay that honours the operation context.
pub struct MockStore {
    fetch: Box<FetchFn>,
    add: Box<AddFn>,
    remove: Box<RemoveFn>,
    update: Box<UpdateFn>,
    delay: Option<Duration>,
    pub calls: Calls,
    pub last_fetch: Mutex<Option<(String, Option<AssetType>, Pagination)>>,
    pub last_update: Mutex<Option<(String, String, String)>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            fetch: Box::new(|_, _, _| Ok(two_charts())),
            add: Box::new(|_| Ok(())),
            remove: Box::new(|_| Ok(())),
            update: Box::new(|_, _| Ok(())),
            delay: None,
            calls: Calls::default(),
            last_fetch: Mutex::new(None),
            last_update: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_fetch(
        mut self,
        f: impl Fn(&str, Option<&AssetType>, Pagination) -> StoreResult<Vec<Asset>> + Send + Sync + 'static,
    ) -> Self {
        self.fetch = Box::new(f);
        self
    }

    pub fn with_add(mut self, f: impl Fn(&Asset) -> StoreResult<()> + Send + Sync + 'static) -> Self {
        self.add = Box::new(f);
        self
    }

    pub fn with_remove(mut self, f: impl Fn(&str) -> StoreResult<()> + Send + Sync + 'static) -> Self {
        self.remove = Box::new(f);
        self
    }

    pub fn with_update(mut self, f: impl Fn(&str, &str) -> StoreResult<()> + Send + Sync + 'static) -> Self {
        self.update = Box::new(f);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every operation fails with the same store message.
    pub fn failing(message: &'static str) -> Self {
        Self::new()
            .with_fetch(move |_, _, _| Err(StoreError::Other(message.to_string())))
            .with_add(move |_| Err(StoreError::Other(message.to_string())))
            .with_remove(move |_| Err(StoreError::Other(message.to_string())))
            .with_update(move |_, _| Err(StoreError::Other(message.to_string())))
    }

    /// Every operation reports the deadline-exceeded signal.
    pub fn timing_out() -> Self {
        Self::new()
            .with_fetch(|_, _, _| Err(StoreError::DeadlineExceeded))
            .with_add(|_| Err(StoreError::DeadlineExceeded))
            .with_remove(|_| Err(StoreError::DeadlineExceeded))
            .with_update(|_, _| Err(StoreError::DeadlineExceeded))
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn pause(&self, ctx: &OpContext) -> StoreResult<()> {
        match self.delay {
            Some(delay) => {
                ctx.run(async {
                    tokio::time::sleep(delay).await;
                    Ok::<_, StoreError>(())
                })
                .await
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Store for MockStore {
    async fn fetch_favorites(
        &self,
        ctx: &OpContext,
        user_id: &str,
        filter: Option<AssetType>,
        page: Pagination,
    ) -> StoreResult<Vec<Asset>> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        *self.last_fetch.lock().unwrap() = Some((user_id.to_string(), filter.clone(), page));
        self.pause(ctx).await?;
        (self.fetch)(user_id, filter.as_ref(), page)
    }

    async fn add_favorite(&self, ctx: &OpContext, _user_id: &str, asset: &Asset) -> StoreResult<()> {
        self.calls.add.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let paused = self.pause(ctx).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        paused?;
        (self.add)(asset)
    }

    async fn remove_favorite(&self, ctx: &OpContext, _user_id: &str, asset_id: &str) -> StoreResult<()> {
        self.calls.remove.fetch_add(1, Ordering::SeqCst);
        self.pause(ctx).await?;
        (self.remove)(asset_id)
    }

    async fn update_description(
        &self,
        ctx: &OpContext,
        user_id: &str,
        asset_id: &str,
        description: &str,
    ) -> StoreResult<()> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        *self.last_update.lock().unwrap() =
            Some((user_id.to_string(), asset_id.to_string(), description.to_string()));
        self.pause(ctx).await?;
        (self.update)(asset_id, description)
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

pub fn chart(id: &str, description: &str) -> Asset {
    Asset {
        id: id.to_string(),
        asset_type: AssetType::Chart,
        description: description.to_string(),
        data: serde_json::json!({ "title": format!("Chart {}", id), "axisTitle": "x", "data": [1, 2, 3] }),
    }
}

pub fn two_charts() -> Vec<Asset> {
    vec![chart("1", "Test Asset 1"), chart("2", "Test Asset 2")]
}

/// Test configuration: short deadlines and retries without backoff.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.handlers.read_timeout_ms = 200;
    cfg.handlers.write_timeout_ms = 200;
    cfg.retry = RetryConfig { max_attempts: 3, base_delay_ms: 0, max_jitter_ms: 0 };
    cfg
}

pub fn app_with_config(store: Arc<MockStore>, cfg: AppConfig) -> (Router, AppState) {
    let state = AppState::new(store, cfg);
    (routes::router(state.clone()), state)
}

pub fn app(store: Arc<MockStore>) -> (Router, AppState) {
    app_with_config(store, test_config())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse { status, headers, body: String::from_utf8(bytes.to_vec()).unwrap() }
}
