use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
    pub connect_attempts: u32,
}

/// Per-request time budgets for store work.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl HandlerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BatchConfig {
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub handlers: HandlerConfig,
    pub retry: RetryConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Upper bound on store calls a single batch may run at once.
    pub fn batch_concurrency(&self) -> usize {
        self.batch
            .max_concurrency
            .unwrap_or(self.database.max_connections as usize)
            .max(1)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: favorites.toml (in CWD)
        .add_source(::config::File::with_name("favorites").required(false));

    if let Ok(custom_path) = std::env::var("FAVORITES_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("FAVORITES").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub(crate) fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Database pool
    if cfg.database.max_connections == 0 {
        return Err(anyhow::anyhow!("database.max_connections must be > 0"));
    }
    if cfg.database.min_connections > cfg.database.max_connections {
        return Err(anyhow::anyhow!("database.min_connections must be <= max_connections"));
    }
    if cfg.database.connect_attempts == 0 {
        return Err(anyhow::anyhow!("database.connect_attempts must be > 0"));
    }

    // Handlers
    if cfg.handlers.read_timeout_ms == 0 || cfg.handlers.write_timeout_ms == 0 {
        return Err(anyhow::anyhow!("handlers timeouts must be > 0"));
    }

    // Retry
    if cfg.retry.max_attempts == 0 {
        return Err(anyhow::anyhow!("retry.max_attempts must be > 0"));
    }

    if let Some(c) = cfg.batch.max_concurrency {
        if c == 0 {
            return Err(anyhow::anyhow!("batch.max_concurrency must be > 0 when set"));
        }
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
