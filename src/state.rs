use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::retry::RetryPolicy;
use crate::store::Store;

/// The shared application state.
///
/// Built once at startup and handed to the router; handlers reach the store
/// only through it.
#[derive(Clone)]
pub struct AppState {
    /// The favorites store.
    pub store: Arc<dyn Store>,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Retry policy applied to every store call.
    pub retry: RetryPolicy,
    /// Caps concurrent store calls made by batch adds.
    ///
    /// Sized from `batch.max_concurrency`, falling back to the pool size, so a
    /// large batch cannot exhaust the connection pool.
    pub batch_permits: Arc<Semaphore>,
    /// The application metrics.
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let retry = config.retry.policy();
        let batch_permits = Arc::new(Semaphore::new(config.batch_concurrency()));
        Self { store, config: Arc::new(config), retry, batch_permits, metrics: Metrics::new() }
    }
}
