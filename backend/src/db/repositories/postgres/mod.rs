//! PostgreSQL repository using Diesel.
//!
//! Stores access events in `access_logs` and the bitácora in `auditoria`,
//! keeping the column names of the existing dashboard database.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Embedded migrations run on startup
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Timestamptz};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    AccessLogRepository, AuditRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::{
    AccessEvent, AccessEventId, ActionCount, AuditEvent, AuditEventId, AuditFilter,
    NewAccessEvent, NewAuditEvent, Page, PageRequest, UserId,
};
use crate::services::heatmap::RawHourlyCount;

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

const HOURLY_COUNTS_SQL: &str = r#"
    SELECT EXTRACT(HOUR FROM "timestamp" AT TIME ZONE 'UTC')::int4 AS hour,
           EXTRACT(DOW FROM "timestamp" AT TIME ZONE 'UTC')::int4 AS day_of_week,
           COUNT(*)::int8 AS count
    FROM access_logs
    WHERE "timestamp" >= $1 AND "timestamp" <= $2
    GROUP BY 1, 2
    ORDER BY 1, 2
"#;

/// Ties sort by `accion` in byte order, matching `str` ordering in the
/// in-memory backend regardless of the database collation.
const TOP_ACTIONS_SQL: &str = r#"
    SELECT accion AS action,
           COUNT(*)::int8 AS count
    FROM auditoria
    GROUP BY accion
    ORDER BY count DESC, accion COLLATE "C" ASC
    LIMIT $1
"#;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables (see module docs).
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Build the pool and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::from(e).with_operation("get_connection_for_migrations")
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run `f` on a pooled connection in the blocking pool, retrying
    /// retryable failures up to `max_retries` times with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::timeout_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    (page.limit as i64, page.offset() as i64)
}

fn decode_access_rows(rows: Vec<AccessLogRow>) -> RepositoryResult<Vec<AccessEvent>> {
    rows.into_iter().map(AccessEvent::try_from).collect()
}

/// `%`-wrapped ILIKE pattern with the LIKE metacharacters escaped.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl AccessLogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_access_event(&self, event: NewAccessEvent) -> RepositoryResult<AccessEvent> {
        let row = NewAccessLogRow::from(&event);
        let inserted = self
            .with_conn(move |conn| {
                diesel::insert_into(access_logs::table)
                    .values(&row)
                    .returning(AccessLogRow::as_returning())
                    .get_result::<AccessLogRow>(conn)
                    .map_err(|e| map_diesel_error(e).with_operation("insert_access_event"))
            })
            .await?;
        AccessEvent::try_from(inserted)
    }

    async fn get_access_event(&self, id: AccessEventId) -> RepositoryResult<AccessEvent> {
        let row = self
            .with_conn(move |conn| {
                access_logs::table
                    .find(id.value())
                    .select(AccessLogRow::as_select())
                    .first::<AccessLogRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)
            })
            .await?;
        match row {
            Some(row) => AccessEvent::try_from(row),
            None => Err(RepositoryError::not_found_with_context(
                format!("Access event {} not found", id),
                ErrorContext::new("get_access_event")
                    .with_entity("access_logs")
                    .with_entity_id(id),
            )),
        }
    }

    async fn list_access_events(&self, page: PageRequest) -> RepositoryResult<Page<AccessEvent>> {
        let (limit, offset) = page_bounds(page);
        let (rows, total) = self
            .with_conn(move |conn| {
                let total: i64 = access_logs::table
                    .count()
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
                let rows = access_logs::table
                    .select(AccessLogRow::as_select())
                    .order((access_logs::timestamp.desc(), access_logs::id.desc()))
                    .limit(limit)
                    .offset(offset)
                    .load::<AccessLogRow>(conn)
                    .map_err(map_diesel_error)?;
                Ok((rows, total))
            })
            .await?;
        Ok(Page {
            items: decode_access_rows(rows)?,
            total: total.max(0) as u64,
            request: page,
        })
    }

    async fn list_access_events_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> RepositoryResult<Page<AccessEvent>> {
        let (limit, offset) = page_bounds(page);
        let uid = user_id.value();
        let (rows, total) = self
            .with_conn(move |conn| {
                let total: i64 = access_logs::table
                    .filter(access_logs::usuario_id.eq(uid))
                    .count()
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
                let rows = access_logs::table
                    .filter(access_logs::usuario_id.eq(uid))
                    .select(AccessLogRow::as_select())
                    .order((access_logs::timestamp.desc(), access_logs::id.desc()))
                    .limit(limit)
                    .offset(offset)
                    .load::<AccessLogRow>(conn)
                    .map_err(map_diesel_error)?;
                Ok((rows, total))
            })
            .await?;
        Ok(Page {
            items: decode_access_rows(rows)?,
            total: total.max(0) as u64,
            request: page,
        })
    }

    async fn fetch_hourly_access_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<RawHourlyCount>> {
        let rows = self
            .with_conn(move |conn| {
                sql_query(HOURLY_COUNTS_SQL)
                    .bind::<Timestamptz, _>(start)
                    .bind::<Timestamptz, _>(end)
                    .load::<HourlyCountRow>(conn)
                    .map_err(|e| map_diesel_error(e).with_operation("fetch_hourly_access_counts"))
            })
            .await?;
        Ok(rows.into_iter().map(RawHourlyCount::from).collect())
    }
}

#[async_trait]
impl AuditRepository for PostgresRepository {
    async fn insert_audit_event(&self, event: NewAuditEvent) -> RepositoryResult<AuditEvent> {
        let row = NewAuditRow::from(&event);
        self.with_conn(move |conn| {
            diesel::insert_into(auditoria::table)
                .values(&row)
                .returning(AuditRow::as_returning())
                .get_result::<AuditRow>(conn)
                .map(AuditEvent::from)
                .map_err(|e| map_diesel_error(e).with_operation("insert_audit_event"))
        })
        .await
    }

    async fn get_audit_event(&self, id: AuditEventId) -> RepositoryResult<AuditEvent> {
        let row = self
            .with_conn(move |conn| {
                auditoria::table
                    .find(id.value())
                    .select(AuditRow::as_select())
                    .first::<AuditRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)
            })
            .await?;
        row.map(AuditEvent::from).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Audit event {} not found", id),
                ErrorContext::new("get_audit_event")
                    .with_entity("auditoria")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_audit_events(
        &self,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<AuditEvent>> {
        let (limit, offset) = page_bounds(page);
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);
        let (rows, total) = self
            .with_conn(move |conn| {
                let mut count_query = auditoria::table.into_boxed();
                let mut rows_query = auditoria::table.into_boxed();
                if let Some(ref pattern) = pattern {
                    count_query = count_query.filter(auditoria::accion.ilike(pattern.clone()));
                    rows_query = rows_query.filter(auditoria::accion.ilike(pattern.clone()));
                }
                let total: i64 = count_query
                    .count()
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
                let rows = rows_query
                    .select(AuditRow::as_select())
                    .order((auditoria::timestamp.desc(), auditoria::id.desc()))
                    .limit(limit)
                    .offset(offset)
                    .load::<AuditRow>(conn)
                    .map_err(map_diesel_error)?;
                Ok((rows, total))
            })
            .await?;
        Ok(Page {
            items: rows.into_iter().map(AuditEvent::from).collect(),
            total: total.max(0) as u64,
            request: page,
        })
    }

    async fn count_audit_events(&self) -> RepositoryResult<u64> {
        let total: i64 = self
            .with_conn(|conn| {
                auditoria::table
                    .count()
                    .get_result(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn count_audit_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<u64> {
        let total: i64 = self
            .with_conn(move |conn| {
                auditoria::table
                    .filter(auditoria::timestamp.ge(start))
                    .filter(auditoria::timestamp.lt(end))
                    .count()
                    .get_result(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn top_audit_actions(&self, limit: usize) -> RepositoryResult<Vec<ActionCount>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .with_conn(move |conn| {
                sql_query(TOP_ACTIONS_SQL)
                    .bind::<BigInt, _>(limit)
                    .load::<ActionCountRow>(conn)
                    .map_err(|e| map_diesel_error(e).with_operation("top_audit_actions"))
            })
            .await?;
        Ok(rows.into_iter().map(ActionCount::from).collect())
    }
}
