//! Postgres access for truth alignment: replica reader, mirror store, run lock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Postgres, Row};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use talign_core::{clamp_sessions, MirrorPatch, MirrorRecord, StaffDirectory, TruthRecord};

pub const CRATE_NAME: &str = "talign-db";

/// Audit-log platform tag shared by every run of this service.
pub const PLATFORM_TAG: &str = "aws_truth";
pub const SYNC_TYPE_ALIGNMENT: &str = "alignment";

/// Advisory lock key guarding single-run-at-a-time execution ("talign" in ascii).
const RUN_LOCK_KEY: i64 = 0x7461_6c69_676e;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("configuration: {0}")]
    Config(String),
    #[error("connecting to {target}: {source}")]
    Connect {
        target: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("query against {target}: {source}")]
    Query {
        target: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("partial mirror write: expected {expected} rows, updated {updated}")]
    PartialWrite { expected: u64, updated: u64 },
}

/// The two named read replicas this service may read truth from. Selection is a
/// configuration decision made once at startup, never per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaName {
    Backoffice,
    PowerBi,
}

impl ReplicaName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaName::Backoffice => "backoffice",
            ReplicaName::PowerBi => "powerbi",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "backoffice" => Some(ReplicaName::Backoffice),
            "powerbi" => Some(ReplicaName::PowerBi),
            _ => None,
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            ReplicaName::Backoffice => "RDS_BACKOFFICE",
            ReplicaName::PowerBi => "RDS_POWERBI",
        }
    }
}

impl std::fmt::Display for ReplicaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection parameters for one replica, resolved from `RDS_<NAME>_*` env vars
/// once at process start. The password stays optional here so a missing secret
/// surfaces as a config error at connect time, not a panic at parse time.
#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    pub name: ReplicaName,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
}

impl ReplicaConfig {
    pub fn from_env(name: ReplicaName) -> Self {
        let prefix = name.env_prefix();
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();
        Self {
            name,
            host: var("HOST").unwrap_or_else(|| "localhost".to_string()),
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(5432),
            database: var("DATABASE").unwrap_or_else(|| "fitness".to_string()),
            user: var("USER").unwrap_or_else(|| "readonly".to_string()),
            password: var("PASSWORD"),
        }
    }
}

/// Read-only reader against the selected AWS replica. Every public method opens
/// its own single-connection pool and closes it on all exit paths.
#[derive(Debug, Clone)]
pub struct TruthSource {
    config: ReplicaConfig,
}

const TRUTH_QUERY: &str = r#"
SELECT
    m.email,
    p.remainingsessions::bigint AS outstanding_sessions,
    COALESCE(p.packsize, 0)::bigint AS total_purchased,
    (
        SELECT s.trainer_name
          FROM enhancesch.vw_schedulers s
         WHERE s.id_client = m.id_client
           AND s.status IN ('Completed', 'Attended')
         ORDER BY s.training_date_utc DESC
         LIMIT 1
    ) AS coach_name,
    (
        SELECT MAX(s.training_date_utc)
          FROM enhancesch.vw_schedulers s
         WHERE s.id_client = m.id_client
           AND s.status IN ('Completed', 'Attended')
    ) AS last_session_at,
    (
        SELECT COUNT(*)
          FROM enhancesch.vw_schedulers s
         WHERE s.id_client = m.id_client
           AND s.status IN ('Completed', 'Attended')
           AND s.training_date_utc >= CURRENT_DATE - INTERVAL '7 days'
    ) AS sessions_last_7d,
    (
        SELECT COUNT(*)
          FROM enhancesch.vw_schedulers s
         WHERE s.id_client = m.id_client
           AND s.status IN ('Completed', 'Attended')
           AND s.training_date_utc >= CURRENT_DATE - INTERVAL '30 days'
    ) AS sessions_last_30d,
    (
        SELECT COUNT(*)
          FROM enhancesch.vw_schedulers s
         WHERE s.id_client = m.id_client
           AND s.status IN ('Completed', 'Attended')
           AND s.training_date_utc >= CURRENT_DATE - INTERVAL '90 days'
    ) AS sessions_last_90d
FROM enhancesch.vw_client_master m
JOIN enhancesch.vw_client_packages p ON m.id_client = p.id_client
WHERE p.remainingsessions >= 0
  AND m.email IS NOT NULL
LIMIT $1
"#;

impl TruthSource {
    pub fn new(config: ReplicaConfig) -> Self {
        Self { config }
    }

    pub fn replica(&self) -> ReplicaName {
        self.config.name
    }

    async fn connect(&self) -> Result<PgPool, DbError> {
        let password = self.config.password.as_deref().ok_or_else(|| {
            DbError::Config(format!(
                "{}_PASSWORD is not set for replica '{}'",
                self.config.name.env_prefix(),
                self.config.name
            ))
        })?;

        let options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .password(password)
            .ssl_mode(PgSslMode::Prefer)
            // Read-only discipline at the session level: the replica must never
            // be mutated even if the credential would allow it.
            .options([("default_transaction_read_only", "on")]);

        PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| DbError::Connect {
                target: self.config.name.as_str(),
                source,
            })
    }

    /// Fetch the full truth set in one aggregate query: package balances plus
    /// the latest trainer and trailing 7/30/90-day completed-session counts per
    /// client. Fails fast on any error; no partial truth set is returned.
    pub async fn fetch_truth(&self, limit: i64) -> Result<Vec<TruthRecord>, DbError> {
        let pool = self.connect().await?;
        let result = self.fetch_truth_with(&pool, limit).await;
        pool.close().await;
        result
    }

    async fn fetch_truth_with(&self, pool: &PgPool, limit: i64) -> Result<Vec<TruthRecord>, DbError> {
        let target = self.config.name.as_str();
        let rows = sqlx::query(TRUTH_QUERY)
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(|source| DbError::Query { target, source })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let email: String = row.try_get("email").map_err(|source| DbError::Query { target, source })?;
            let outstanding: i64 = row
                .try_get("outstanding_sessions")
                .map_err(|source| DbError::Query { target, source })?;
            let total_purchased: i64 = row
                .try_get("total_purchased")
                .map_err(|source| DbError::Query { target, source })?;
            let coach_name: Option<String> = row
                .try_get("coach_name")
                .map_err(|source| DbError::Query { target, source })?;
            let last_session_at: Option<DateTime<Utc>> = row
                .try_get("last_session_at")
                .map_err(|source| DbError::Query { target, source })?;
            let s7: i64 = row
                .try_get("sessions_last_7d")
                .map_err(|source| DbError::Query { target, source })?;
            let s30: i64 = row
                .try_get("sessions_last_30d")
                .map_err(|source| DbError::Query { target, source })?;
            let s90: i64 = row
                .try_get("sessions_last_90d")
                .map_err(|source| DbError::Query { target, source })?;

            records.push(TruthRecord {
                email,
                outstanding_sessions: clamp_sessions(outstanding),
                total_purchased: clamp_sessions(total_purchased),
                coach_name: coach_name.filter(|n| !n.trim().is_empty()),
                sessions_last_7d: clamp_sessions(s7),
                sessions_last_30d: clamp_sessions(s30),
                sessions_last_90d: clamp_sessions(s90),
                last_session_at,
            });
        }
        Ok(records)
    }

    /// Real-time operational numbers for the dashboard snapshot endpoint. All
    /// queries are read-only aggregates over the scheduling and package views.
    pub async fn ops_snapshot(&self) -> Result<OpsSnapshot, DbError> {
        let pool = self.connect().await?;
        let result = self.ops_snapshot_with(&pool).await;
        pool.close().await;
        result
    }

    async fn ops_snapshot_with(&self, pool: &PgPool) -> Result<OpsSnapshot, DbError> {
        let target = self.config.name.as_str();
        let q = |source| DbError::Query { target, source };

        let overall_row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE s.training_date_utc::date = CURRENT_DATE) AS sessions_today,
                COUNT(*) FILTER (WHERE s.training_date_utc::date = CURRENT_DATE
                                   AND s.status IN ('Completed', 'Attended')) AS completed_today,
                COUNT(*) FILTER (WHERE s.training_date_utc::date = CURRENT_DATE
                                   AND s.status = 'No Show') AS no_shows_today,
                COUNT(*) FILTER (WHERE s.training_date_utc::date = CURRENT_DATE - 1) AS sessions_yesterday,
                COUNT(DISTINCT s.id_client) FILTER (WHERE s.status IN ('Completed', 'Attended')) AS active_clients_7d,
                COUNT(DISTINCT s.trainer_name) FILTER (WHERE s.training_date_utc::date = CURRENT_DATE) AS coaches_active_today
              FROM enhancesch.vw_schedulers s
             WHERE s.training_date_utc >= CURRENT_DATE - INTERVAL '7 days'
            "#,
        )
        .fetch_one(pool)
        .await
        .map_err(q)?;

        let overall = OverallStats {
            sessions_today: overall_row.try_get("sessions_today").map_err(q)?,
            completed_today: overall_row.try_get("completed_today").map_err(q)?,
            no_shows_today: overall_row.try_get("no_shows_today").map_err(q)?,
            sessions_yesterday: overall_row.try_get("sessions_yesterday").map_err(q)?,
            active_clients_7d: overall_row.try_get("active_clients_7d").map_err(q)?,
            coaches_active_today: overall_row.try_get("coaches_active_today").map_err(q)?,
        };

        let coach_rows = sqlx::query(
            r#"
            SELECT s.trainer_name AS coach,
                   s.training_date_utc::date AS training_date,
                   COUNT(*) AS total_sessions,
                   COUNT(*) FILTER (WHERE s.status IN ('Completed', 'Attended')) AS completed,
                   COUNT(*) FILTER (WHERE s.status = 'No Show') AS no_shows,
                   COUNT(*) FILTER (WHERE s.status = 'Cancelled') AS cancelled,
                   COUNT(*) FILTER (WHERE s.status IN ('Scheduled', 'Confirmed')) AS scheduled
              FROM enhancesch.vw_schedulers s
             WHERE s.training_date_utc::date >= CURRENT_DATE - INTERVAL '3 days'
               AND s.training_date_utc::date <= CURRENT_DATE
               AND s.trainer_name IS NOT NULL
               AND s.trainer_name != ''
             GROUP BY s.trainer_name, s.training_date_utc::date
             ORDER BY s.training_date_utc::date DESC, total_sessions DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(q)?;

        let mut sessions_last_3_days = Vec::with_capacity(coach_rows.len());
        for row in coach_rows {
            sessions_last_3_days.push(CoachDayLoad {
                coach: row.try_get("coach").map_err(q)?,
                training_date: row.try_get("training_date").map_err(q)?,
                total_sessions: row.try_get("total_sessions").map_err(q)?,
                completed: row.try_get("completed").map_err(q)?,
                no_shows: row.try_get("no_shows").map_err(q)?,
                cancelled: row.try_get("cancelled").map_err(q)?,
                scheduled: row.try_get("scheduled").map_err(q)?,
            });
        }

        let low_rows = sqlx::query(
            r#"
            SELECT m.full_name AS client_name,
                   m.email,
                   p.name_packet AS package_name,
                   p.remainingsessions::bigint AS sessions_left,
                   p.packsize::bigint AS total_purchased,
                   (
                       SELECT s.trainer_name
                         FROM enhancesch.vw_schedulers s
                        WHERE s.id_client = m.id_client
                          AND s.status IN ('Completed', 'Attended')
                        ORDER BY s.training_date_utc DESC
                        LIMIT 1
                   ) AS coach,
                   (
                       SELECT MAX(s.training_date_utc)
                         FROM enhancesch.vw_schedulers s
                        WHERE s.id_client = m.id_client
                          AND s.status IN ('Completed', 'Attended')
                   ) AS last_session_at
              FROM enhancesch.vw_client_master m
              JOIN enhancesch.vw_client_packages p ON m.id_client = p.id_client
             WHERE p.remainingsessions BETWEEN 1 AND 5
             ORDER BY p.remainingsessions ASC
             LIMIT 200
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(q)?;

        let mut packages_running_low = Vec::with_capacity(low_rows.len());
        for row in low_rows {
            packages_running_low.push(LowPackageAlert {
                client_name: row.try_get("client_name").map_err(q)?,
                email: row.try_get("email").map_err(q)?,
                package_name: row.try_get("package_name").map_err(q)?,
                sessions_left: row.try_get("sessions_left").map_err(q)?,
                total_purchased: row.try_get("total_purchased").map_err(q)?,
                coach: row.try_get("coach").map_err(q)?,
                last_session_at: row.try_get("last_session_at").map_err(q)?,
            });
        }

        Ok(OpsSnapshot {
            generated_at: Utc::now(),
            replica: self.config.name,
            overall,
            sessions_last_3_days,
            packages_running_low,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub replica: ReplicaName,
    pub overall: OverallStats,
    pub sessions_last_3_days: Vec<CoachDayLoad>,
    pub packages_running_low: Vec<LowPackageAlert>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub sessions_today: i64,
    pub completed_today: i64,
    pub no_shows_today: i64,
    pub sessions_yesterday: i64,
    pub active_clients_7d: i64,
    pub coaches_active_today: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachDayLoad {
    pub coach: String,
    pub training_date: NaiveDate,
    pub total_sessions: i64,
    pub completed: i64,
    pub no_shows: i64,
    pub cancelled: i64,
    pub scheduled: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowPackageAlert {
    pub client_name: Option<String>,
    pub email: Option<String>,
    pub package_name: Option<String>,
    pub sessions_left: i64,
    pub total_purchased: Option<i64>,
    pub coach: Option<String>,
    pub last_session_at: Option<DateTime<Utc>>,
}

/// One row appended to the audit table at the end of every run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncLogEntry {
    pub status: String,
    pub records_processed: i32,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Audit row as read back for the operator page.
#[derive(Debug, Clone, Serialize)]
pub struct SyncLogRow {
    pub platform: String,
    pub sync_type: String,
    pub status: String,
    pub records_processed: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Holds the advisory lock for the duration of one run. The lock is session
/// scoped, so the underlying connection must stay checked out until release.
pub struct RunLock {
    conn: PoolConnection<Postgres>,
}

impl RunLock {
    pub async fn release(mut self) {
        if let Err(err) = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(RUN_LOCK_KEY)
            .execute(&mut *self.conn)
            .await
        {
            warn!(error = %err, "failed to release alignment run lock");
        }
    }
}

/// Pooled client for the primary application database ("mirror" side).
#[derive(Debug, Clone)]
pub struct MirrorStore {
    pool: PgPool,
}

impl MirrorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|source| DbError::Connect {
                target: "mirror",
                source,
            })?;
        Ok(Self { pool })
    }

    fn query_err(source: sqlx::Error) -> DbError {
        DbError::Query {
            target: "mirror",
            source,
        }
    }

    /// Try to take the single-run advisory lock. `None` means another
    /// alignment run currently holds it.
    pub async fn try_lock_run(&self) -> Result<Option<RunLock>, DbError> {
        let mut conn = self.pool.acquire().await.map_err(|source| DbError::Connect {
            target: "mirror",
            source,
        })?;
        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(RUN_LOCK_KEY)
            .fetch_one(&mut *conn)
            .await
            .map_err(Self::query_err)?;
        Ok(locked.then(|| RunLock { conn }))
    }

    /// All customer-stage contacts, projected down to the compared fields.
    pub async fn load_customers(&self) -> Result<Vec<MirrorRecord>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, outstanding_sessions, assigned_coach_id,
                   sessions_last_7d, sessions_last_30d, sessions_last_90d,
                   last_paid_session_date
              FROM contacts
             WHERE lifecycle_stage = 'customer'
               AND email IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::query_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(MirrorRecord {
                id: row.try_get("id").map_err(Self::query_err)?,
                email: row.try_get("email").map_err(Self::query_err)?,
                outstanding_sessions: row
                    .try_get("outstanding_sessions")
                    .map_err(Self::query_err)?,
                coach_id: row.try_get("assigned_coach_id").map_err(Self::query_err)?,
                sessions_last_7d: row.try_get("sessions_last_7d").map_err(Self::query_err)?,
                sessions_last_30d: row.try_get("sessions_last_30d").map_err(Self::query_err)?,
                sessions_last_90d: row.try_get("sessions_last_90d").map_err(Self::query_err)?,
                last_paid_session_at: row
                    .try_get("last_paid_session_date")
                    .map_err(Self::query_err)?,
            });
        }
        Ok(records)
    }

    pub async fn load_staff_directory(&self) -> Result<StaffDirectory, DbError> {
        let rows = sqlx::query("SELECT id, full_name FROM staff")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::query_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id").map_err(Self::query_err)?;
            let full_name: Option<String> = row.try_get("full_name").map_err(Self::query_err)?;
            if let Some(name) = full_name {
                entries.push((name, id));
            }
        }
        Ok(StaffDirectory::from_entries(entries))
    }

    /// Apply every patch in one batched update-by-id statement. Empty input is
    /// a no-op. A single statement either updates every targeted row or errors,
    /// so a partial write can only mean a patched contact vanished mid-run;
    /// that is surfaced as its own error rather than silently accepted.
    pub async fn apply_patches(&self, patches: &[MirrorPatch]) -> Result<u64, DbError> {
        if patches.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = patches.iter().map(|p| p.contact_id).collect();
        let outstanding: Vec<i32> = patches.iter().map(|p| p.outstanding_sessions).collect();
        let coaches: Vec<Option<Uuid>> = patches.iter().map(|p| p.coach_id).collect();
        let s7: Vec<i32> = patches.iter().map(|p| p.sessions_last_7d).collect();
        let s30: Vec<i32> = patches.iter().map(|p| p.sessions_last_30d).collect();
        let s90: Vec<i32> = patches.iter().map(|p| p.sessions_last_90d).collect();
        let last_paid: Vec<Option<DateTime<Utc>>> =
            patches.iter().map(|p| p.last_paid_session_at).collect();
        let updated: Vec<DateTime<Utc>> = patches.iter().map(|p| p.updated_at).collect();

        let result = sqlx::query(
            r#"
            UPDATE contacts AS c
               SET outstanding_sessions = u.outstanding_sessions,
                   assigned_coach_id = u.assigned_coach_id,
                   sessions_last_7d = u.sessions_last_7d,
                   sessions_last_30d = u.sessions_last_30d,
                   sessions_last_90d = u.sessions_last_90d,
                   last_paid_session_date = u.last_paid_session_date,
                   updated_at = u.updated_at
              FROM UNNEST(
                       $1::uuid[], $2::int4[], $3::uuid[], $4::int4[],
                       $5::int4[], $6::int4[], $7::timestamptz[], $8::timestamptz[]
                   ) AS u(id, outstanding_sessions, assigned_coach_id, sessions_last_7d,
                          sessions_last_30d, sessions_last_90d, last_paid_session_date,
                          updated_at)
             WHERE c.id = u.id
            "#,
        )
        .bind(&ids)
        .bind(&outstanding)
        .bind(&coaches)
        .bind(&s7)
        .bind(&s30)
        .bind(&s90)
        .bind(&last_paid)
        .bind(&updated)
        .execute(&self.pool)
        .await
        .map_err(Self::query_err)?;

        let expected = patches.len() as u64;
        let updated_rows = result.rows_affected();
        if updated_rows != expected {
            return Err(DbError::PartialWrite {
                expected,
                updated: updated_rows,
            });
        }
        Ok(updated_rows)
    }

    pub async fn append_sync_log(&self, entry: &SyncLogEntry) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO sync_logs (platform, sync_type, status, records_processed, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(PLATFORM_TAG)
        .bind(SYNC_TYPE_ALIGNMENT)
        .bind(&entry.status)
        .bind(entry.records_processed)
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(Self::query_err)?;
        Ok(())
    }

    pub async fn recent_sync_logs(&self, limit: i64) -> Result<Vec<SyncLogRow>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT platform, sync_type, status, records_processed, message, created_at
              FROM sync_logs
             WHERE platform = $1
             ORDER BY created_at DESC
             LIMIT $2
            "#,
        )
        .bind(PLATFORM_TAG)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::query_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(SyncLogRow {
                platform: row.try_get("platform").map_err(Self::query_err)?,
                sync_type: row.try_get("sync_type").map_err(Self::query_err)?,
                status: row.try_get("status").map_err(Self::query_err)?,
                records_processed: row.try_get("records_processed").map_err(Self::query_err)?,
                message: row.try_get("message").map_err(Self::query_err)?,
                created_at: row.try_get("created_at").map_err(Self::query_err)?,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_names_round_trip() {
        assert_eq!(ReplicaName::parse("backoffice"), Some(ReplicaName::Backoffice));
        assert_eq!(ReplicaName::parse(" PowerBI "), Some(ReplicaName::PowerBi));
        assert_eq!(ReplicaName::parse("reporting"), None);
        assert_eq!(ReplicaName::Backoffice.to_string(), "backoffice");
        assert_eq!(ReplicaName::PowerBi.to_string(), "powerbi");
    }

    #[test]
    fn replica_env_prefixes_are_distinct() {
        assert_eq!(ReplicaName::Backoffice.env_prefix(), "RDS_BACKOFFICE");
        assert_eq!(ReplicaName::PowerBi.env_prefix(), "RDS_POWERBI");
    }

    #[tokio::test]
    async fn missing_password_is_a_config_error() {
        let source = TruthSource::new(ReplicaConfig {
            name: ReplicaName::Backoffice,
            host: "localhost".into(),
            port: 5432,
            database: "fitness".into(),
            user: "readonly".into(),
            password: None,
        });
        let err = source.connect().await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
        assert!(err.to_string().contains("RDS_BACKOFFICE_PASSWORD"));
    }
}
