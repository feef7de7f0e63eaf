//! Connection pool helpers.
//!
//! A pooled `deadpool_postgres::Client` is itself a [`RowStore`](crate::RowStore),
//! so compiled predicates can be fetched straight from a checked-out connection.
//!
//! # Example
//!
//! ```ignore
//! let pool = pgfilter::create_pool_with_config(
//!     &std::env::var("DATABASE_URL")?,
//!     &pgfilter::PoolConfig::from_env()?,
//! )?;
//! let client = pool.get().await?;
//! let rows = pgfilter::fetch(&client, &schema, qb.build()?).await?;
//! ```

use crate::error::{FilterError, FilterResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Environment variable read by [`PoolConfig::from_env`].
pub const POOL_MAX_SIZE_ENV: &str = "PGFILTER_POOL_MAX_SIZE";

const DEFAULT_MAX_SIZE: usize = 16;

/// Pool sizing and connection recycling.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of open connections.
    pub max_size: usize,
    /// How a returned connection is checked before reuse.
    pub recycling_method: RecyclingMethod,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            recycling_method: RecyclingMethod::Fast,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of connections.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Run a test query on every connection before handing it out again.
    pub fn verified_recycling(mut self) -> Self {
        self.recycling_method = RecyclingMethod::Verified;
        self
    }

    /// Defaults, with `max_size` overridden by `PGFILTER_POOL_MAX_SIZE` when set.
    pub fn from_env() -> FilterResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FilterResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(POOL_MAX_SIZE_ENV) {
            config.max_size = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(FilterError::Pool(format!(
                        "{POOL_MAX_SIZE_ENV} must be a positive integer, got '{raw}'"
                    )));
                }
            };
        }
        Ok(config)
    }
}

/// Create a pool from a database URL with default settings, without TLS.
pub fn create_pool(database_url: &str) -> FilterResult<Pool> {
    create_pool_with_config(database_url, &PoolConfig::default())
}

/// Create a pool from a database URL and a [`PoolConfig`], without TLS.
///
/// No connection is opened until the first `pool.get()`.
pub fn create_pool_with_config(database_url: &str, config: &PoolConfig) -> FilterResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| FilterError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: config.recycling_method.clone(),
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    let pool = Pool::builder(mgr)
        .max_size(config.max_size)
        .build()
        .map_err(|e| FilterError::Pool(e.to_string()))?;

    tracing::debug!(
        target: "pgfilter.pool",
        max_size = config.max_size,
        recycling = ?config.recycling_method,
        "connection pool created"
    );
    Ok(pool)
}
