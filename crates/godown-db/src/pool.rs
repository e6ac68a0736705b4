//! # Connection Pool
//!
//! Opens the SQLite file, sizes the pool, and hands out repositories.
//!
//! ## One Request, One Connection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   handler ──► repository ──► pool.acquire (waits ≤ acquire_timeout)     │
//! │                                   │                                     │
//! │                         read, or BEGIN … COMMIT                         │
//! │                                   │                                     │
//! │                   connection returned on drop (also on error)           │
//! │                                                                         │
//! │   Never more than max_connections open; nothing is held between        │
//! │   requests.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SQLite Settings
//! - `journal_mode = WAL`: readers and the single writer don't block each other
//! - `foreign_keys = ON`: off by default in SQLite
//! - `busy_timeout`: a second writer queues on the lock instead of failing
//!   with `SQLITE_BUSY`

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use godown_core::ShortfallPolicy;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::shop::ShopRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Settings for opening a [`Database`].
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/godown/godown.db")
///     .max_connections(8)
///     .acquire_timeout(Duration::from_secs(5))
///     .shortfall_policy(ShortfallPolicy::Backorder);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for a private
    /// in-memory database.
    pub database_path: PathBuf,

    /// Upper bound on open connections (default 5).
    pub max_connections: u32,

    /// How long a caller waits for a free connection (default 10 s).
    pub acquire_timeout: Duration,

    /// How long a statement waits on SQLite's write lock (default 5 s).
    pub busy_timeout: Duration,

    /// Apply pending migrations when opening (default true).
    pub run_migrations: bool,

    /// Passed to every [`OrderRepository`]; governs finalize shortfalls.
    pub shortfall_policy: ShortfallPolicy,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
            shortfall_policy: ShortfallPolicy::default(),
        }
    }

    /// A fresh, private in-memory database for tests.
    ///
    /// Limited to one connection: every connection to `:memory:` would
    /// otherwise see its own empty database.
    pub fn in_memory() -> Self {
        DbConfig::new(IN_MEMORY).max_connections(1)
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn shortfall_policy(mut self, policy: ShortfallPolicy) -> Self {
        self.shortfall_policy = policy;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(IN_MEMORY)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = format!("sqlite://{}?mode=rwc", self.database_path.display());

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", url, e)))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
            .create_if_missing(true);

        Ok(options)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store: the pool plus the shortfall policy.
///
/// Clones share the pool. Repositories are cheap and made per call.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    shortfall_policy: ShortfallPolicy,
}

impl Database {
    /// Opens the database and, unless disabled, migrates it.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening database"
        );

        let options = config.connect_options()?;

        // An in-memory database only lives as long as its connection, so
        // that connection is never reaped.
        let (min_connections, idle_timeout, max_lifetime) = if config.is_in_memory() {
            (1, None, None)
        } else {
            (0, Some(Duration::from_secs(600)), Some(Duration::from_secs(1800)))
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(idle_timeout)
            .max_lifetime(max_lifetime)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(shortfall_policy = ?config.shortfall_policy, "Pool ready");

        let db = Database {
            pool,
            shortfall_policy: config.shortfall_policy,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn shortfall_policy(&self) -> ShortfallPolicy {
        self.shortfall_policy
    }

    pub fn shops(&self) -> ShopRepository {
        ShopRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Order workflows, finalizing under this database's shortfall policy.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone(), self.shortfall_policy)
    }

    /// Waits for checked-out connections to return, then closes them all.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
        assert_eq!(db.shortfall_policy(), ShortfallPolicy::Reject);
    }

    #[tokio::test]
    async fn test_in_memory_databases_are_isolated() {
        let a = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = Database::new(DbConfig::in_memory()).await.unwrap();

        a.shops().insert_shop("Only In A").await.unwrap();

        assert_eq!(a.shops().search("Only", 10).await.unwrap().len(), 1);
        assert!(b.shops().search("Only", 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/godown.db")
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .shortfall_policy(ShortfallPolicy::Backorder);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.shortfall_policy, ShortfallPolicy::Backorder);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
