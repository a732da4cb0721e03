//! Inventory persistence store
//!
//! SQLite-backed store holding one inventory record per user. The write path
//! is a single `INSERT .. ON CONFLICT DO UPDATE` statement so the
//! insert-vs-update decision is made atomically by the database, never by a
//! prior read. Schema creation is deferred to first use: a write that fails
//! with the missing-table signature creates the schema and retries once.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::model::{InventoryRecord, InventorySnapshot, MemoryType, NewInventoryRecord};

/// Default per-statement deadline
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a schema guard call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    /// The table was created by this call
    pub created: bool,
    /// The table was already present
    pub already_existed: bool,
}

/// Outcome of a reconciliation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub user_id: String,
    /// True when this call created the record (no prior row for the user)
    pub inserted: bool,
}

/// How a store statement failed, before taxonomy mapping
enum SqlFailure {
    Timeout,
    Driver(sqlx::Error),
}

/// Inventory store backed by SQLite
pub struct InventoryStore {
    pool: SqlitePool,
    op_timeout: Duration,
}

impl InventoryStore {
    /// Open or create a store at the given path
    ///
    /// Creates the database file if missing. The inventory table itself is
    /// not created here; the first write self-heals (see [`Self::upsert`]).
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::persistence(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::persistence(format!("failed to open database: {}", e)))?;

        info!("Inventory store opened at {}", path.display());
        Ok(Self {
            pool,
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    /// Create an in-memory store (for testing and `:memory:` configs)
    ///
    /// Uses a single pooled connection so every caller sees the same
    /// in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .map_err(|e| StoreError::persistence(format!("failed to create memory db: {}", e)))?;

        Ok(Self {
            pool,
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    /// Override the per-statement deadline
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    // =========================================================================
    // Schema guard
    // =========================================================================

    /// Ensure the inventory table and its indexes exist
    ///
    /// Safe to call repeatedly and concurrently: all DDL uses IF NOT EXISTS,
    /// so a race between two callers never raises a duplicate-object error.
    pub async fn ensure_schema(&self) -> Result<SchemaStatus> {
        let already_existed = self.table_exists().await?;

        for ddl in [SCHEMA_INVENTORY, INDEX_HOSTNAME, INDEX_CREATED_AT] {
            match self.timed(sqlx::query(ddl).execute(&self.pool)).await {
                Ok(_) => {}
                Err(SqlFailure::Timeout) => return Err(StoreError::Timeout(self.op_timeout)),
                Err(SqlFailure::Driver(e)) => {
                    return Err(StoreError::schema(format!("failed to create schema: {}", e)));
                }
            }
        }

        if !already_existed {
            info!("Inventory table created");
        }

        Ok(SchemaStatus {
            created: !already_existed,
            already_existed,
        })
    }

    async fn table_exists(&self) -> Result<bool> {
        let count: i64 = match self
            .timed(
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                )
                .bind(TABLE_NAME)
                .fetch_one(&self.pool),
            )
            .await
        {
            Ok(count) => count,
            Err(SqlFailure::Timeout) => return Err(StoreError::Timeout(self.op_timeout)),
            Err(SqlFailure::Driver(e)) => {
                return Err(StoreError::schema(format!(
                    "failed to check table existence: {}",
                    e
                )));
            }
        };
        Ok(count > 0)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Reconcile one snapshot into the store
    ///
    /// Inserts when no record exists for the user, otherwise replaces every
    /// inventory field while preserving `created_at`. The decision is made
    /// by the database in a single conditional statement. If the statement
    /// fails because the table does not exist yet, the schema is created and
    /// the statement retried exactly once; any other failure is terminal.
    pub async fn upsert(&self, record: &NewInventoryRecord) -> Result<UpsertOutcome> {
        record.validate()?;

        let snapshot = record.snapshot.clone().normalized();
        let gpu_json = serde_json::to_string(&snapshot.gpu)
            .map_err(|e| StoreError::persistence(format!("failed to encode gpu list: {}", e)))?;
        let storage_json = serde_json::to_string(&snapshot.storage).map_err(|e| {
            StoreError::persistence(format!("failed to encode storage list: {}", e))
        })?;
        let now = Utc::now().to_rfc3339();

        let created_at = match self
            .exec_upsert(record, &snapshot, &gpu_json, &storage_json, &now)
            .await
        {
            Ok(created_at) => created_at,
            Err(SqlFailure::Timeout) => return Err(StoreError::Timeout(self.op_timeout)),
            Err(SqlFailure::Driver(e)) if is_missing_table(&e) => {
                info!(
                    user_id = %record.user_id,
                    "Inventory table missing on write, creating schema and retrying"
                );
                self.ensure_schema().await?;
                match self
                    .exec_upsert(record, &snapshot, &gpu_json, &storage_json, &now)
                    .await
                {
                    Ok(created_at) => created_at,
                    Err(SqlFailure::Timeout) => return Err(StoreError::Timeout(self.op_timeout)),
                    Err(SqlFailure::Driver(e)) => {
                        return Err(StoreError::persistence(format!(
                            "upsert failed after schema creation: {}",
                            e
                        )));
                    }
                }
            }
            Err(SqlFailure::Driver(e)) => {
                return Err(StoreError::persistence(format!("upsert failed: {}", e)));
            }
        };

        // Fresh insert iff the row's created_at is the timestamp this call
        // bound; on conflict the stored created_at is preserved.
        let inserted = created_at == now;

        debug!(user_id = %record.user_id, inserted, "Inventory record reconciled");

        Ok(UpsertOutcome {
            user_id: record.user_id.clone(),
            inserted,
        })
    }

    async fn exec_upsert(
        &self,
        record: &NewInventoryRecord,
        snapshot: &InventorySnapshot,
        gpu_json: &str,
        storage_json: &str,
        now: &str,
    ) -> std::result::Result<String, SqlFailure> {
        let row = self
            .timed(
                sqlx::query(UPSERT_INVENTORY)
                    .bind(&record.user_id)
                    .bind(&record.full_name)
                    .bind(&snapshot.hostname)
                    .bind(&snapshot.os)
                    .bind(&snapshot.os_version)
                    .bind(&snapshot.cpu)
                    .bind(snapshot.cpu_cores)
                    .bind(&snapshot.total_memory)
                    .bind(&snapshot.free_memory)
                    .bind(snapshot.memory_type.as_str())
                    .bind(&snapshot.platform)
                    .bind(&snapshot.arch)
                    .bind(&snapshot.username)
                    .bind(gpu_json)
                    .bind(storage_json)
                    .bind(snapshot.captured_at.to_rfc3339())
                    .bind(now)
                    .bind(now)
                    .fetch_one(&self.pool),
            )
            .await?;

        Ok(row.get("created_at"))
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// Get the stored record for a user
    ///
    /// A table that has never been created holds no records, so the
    /// missing-table signature reads as a miss here.
    pub async fn get(&self, user_id: &str) -> Result<InventoryRecord> {
        let row = match self
            .timed(
                sqlx::query(&format!("{} WHERE user_id = ?", SELECT_INVENTORY))
                    .bind(user_id)
                    .fetch_optional(&self.pool),
            )
            .await
        {
            Ok(row) => row,
            Err(SqlFailure::Timeout) => return Err(StoreError::Timeout(self.op_timeout)),
            Err(SqlFailure::Driver(e)) if is_missing_table(&e) => None,
            Err(SqlFailure::Driver(e)) => {
                return Err(StoreError::persistence(format!("get failed: {}", e)));
            }
        };

        match row {
            Some(row) => row_to_record(&row),
            None => Err(StoreError::not_found(user_id)),
        }
    }

    /// List every stored record, newest first
    pub async fn list_all(&self) -> Result<Vec<InventoryRecord>> {
        let rows = match self
            .timed(
                sqlx::query(&format!("{} ORDER BY created_at DESC", SELECT_INVENTORY))
                    .fetch_all(&self.pool),
            )
            .await
        {
            Ok(rows) => rows,
            Err(SqlFailure::Timeout) => return Err(StoreError::Timeout(self.op_timeout)),
            Err(SqlFailure::Driver(e)) if is_missing_table(&e) => Vec::new(),
            Err(SqlFailure::Driver(e)) => {
                return Err(StoreError::persistence(format!("list failed: {}", e)));
            }
        };

        rows.iter().map(row_to_record).collect()
    }

    /// Apply the per-statement deadline to a database future
    async fn timed<T>(
        &self,
        fut: impl Future<Output = sqlx::Result<T>>,
    ) -> std::result::Result<T, SqlFailure> {
        match timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(SqlFailure::Driver(e)),
            Err(_) => Err(SqlFailure::Timeout),
        }
    }
}

/// Classify the "undefined table" failure that triggers self-healing
///
/// SQLite folds missing relations into the generic SQLITE_ERROR primary
/// code, so the driver code alone cannot identify the case; the canonical
/// message signature disambiguates. This is the only place that inspects
/// database error text.
fn is_missing_table(err: &sqlx::Error) -> bool {
    let Some(db_err) = err.as_database_error() else {
        return false;
    };
    let generic_code = db_err.code().is_none_or(|code| code == "1");
    generic_code && db_err.message().contains("no such table")
}

fn row_to_record(row: &SqliteRow) -> Result<InventoryRecord> {
    let memory_type: String = row.get("memory_type");
    let gpu_json: String = row.get("gpu");
    let storage_json: String = row.get("storage");

    let gpu = serde_json::from_str(&gpu_json)
        .map_err(|e| StoreError::persistence(format!("invalid stored gpu list: {}", e)))?;
    let storage = serde_json::from_str(&storage_json)
        .map_err(|e| StoreError::persistence(format!("invalid stored storage list: {}", e)))?;

    Ok(InventoryRecord {
        user_id: row.get("user_id"),
        full_name: row.get("full_name"),
        snapshot: InventorySnapshot {
            hostname: row.get("hostname"),
            os: row.get("os"),
            os_version: row.get("os_version"),
            cpu: row.get("cpu"),
            cpu_cores: row.get("cpu_cores"),
            total_memory: row.get("total_memory"),
            free_memory: row.get("free_memory"),
            memory_type: MemoryType::parse(&memory_type).unwrap_or(MemoryType::Unknown),
            platform: row.get("platform"),
            arch: row.get("arch"),
            username: row.get("username"),
            gpu,
            storage,
            captured_at: parse_timestamp(row, "captured_at")?,
        },
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(column);
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::persistence(format!("invalid stored {}: {}", column, e)))
}

// =============================================================================
// Schema
// =============================================================================

const TABLE_NAME: &str = "pc_inventory";

const SCHEMA_INVENTORY: &str = r#"
CREATE TABLE IF NOT EXISTS pc_inventory (
    user_id TEXT PRIMARY KEY,
    full_name TEXT,
    hostname TEXT NOT NULL,
    os TEXT NOT NULL,
    os_version TEXT NOT NULL,
    cpu TEXT NOT NULL,
    cpu_cores INTEGER NOT NULL,
    total_memory TEXT NOT NULL,
    free_memory TEXT NOT NULL,
    memory_type TEXT NOT NULL,
    platform TEXT NOT NULL,
    arch TEXT NOT NULL,
    username TEXT NOT NULL,
    gpu TEXT NOT NULL,
    storage TEXT NOT NULL,
    captured_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const INDEX_HOSTNAME: &str =
    "CREATE INDEX IF NOT EXISTS idx_pc_inventory_hostname ON pc_inventory(hostname)";

const INDEX_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_pc_inventory_created_at ON pc_inventory(created_at)";

const UPSERT_INVENTORY: &str = r#"
INSERT INTO pc_inventory (
    user_id, full_name, hostname, os, os_version, cpu, cpu_cores,
    total_memory, free_memory, memory_type, platform, arch, username,
    gpu, storage, captured_at, created_at, updated_at
)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (user_id) DO UPDATE SET
    full_name = excluded.full_name,
    hostname = excluded.hostname,
    os = excluded.os,
    os_version = excluded.os_version,
    cpu = excluded.cpu,
    cpu_cores = excluded.cpu_cores,
    total_memory = excluded.total_memory,
    free_memory = excluded.free_memory,
    memory_type = excluded.memory_type,
    platform = excluded.platform,
    arch = excluded.arch,
    username = excluded.username,
    gpu = excluded.gpu,
    storage = excluded.storage,
    captured_at = excluded.captured_at,
    updated_at = excluded.updated_at
RETURNING created_at
"#;

const SELECT_INVENTORY: &str = r#"
SELECT user_id, full_name, hostname, os, os_version, cpu, cpu_cores,
       total_memory, free_memory, memory_type, platform, arch, username,
       gpu, storage, captured_at, created_at, updated_at
FROM pc_inventory
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GpuAdapter, StorageDevice};

    fn record(user_id: &str, hostname: &str) -> NewInventoryRecord {
        NewInventoryRecord {
            user_id: user_id.to_string(),
            full_name: Some("Test User".to_string()),
            snapshot: InventorySnapshot {
                hostname: hostname.to_string(),
                os: "Linux".into(),
                os_version: "6.8".into(),
                cpu: "Ryzen 7 5800X".into(),
                cpu_cores: 8,
                total_memory: "32.00 GB".into(),
                free_memory: "20.00 GB".into(),
                memory_type: MemoryType::Ddr4,
                platform: "linux".into(),
                arch: "x86_64".into(),
                username: "alice".into(),
                gpu: Some(vec![GpuAdapter {
                    name: "Radeon RX 6700".into(),
                    vram: Some("12.00 GB".into()),
                }]),
                storage: Some(vec![StorageDevice {
                    model: "Samsung 980".into(),
                    size: "1.00 TB".into(),
                    manufacturer: Some("Samsung".into()),
                }]),
                captured_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn ensure_schema_reports_creation_then_existence() {
        let store = InventoryStore::in_memory().await.unwrap();

        let first = store.ensure_schema().await.unwrap();
        assert!(first.created);
        assert!(!first.already_existed);

        let second = store.ensure_schema().await.unwrap();
        assert!(!second.created);
        assert!(second.already_existed);
    }

    #[tokio::test]
    async fn cold_start_write_self_heals() {
        let store = InventoryStore::in_memory().await.unwrap();

        // No ensure_schema call: the first write must create the table.
        let outcome = store.upsert(&record("user_1", "devbox")).await.unwrap();
        assert!(outcome.inserted);
        assert_eq!(outcome.user_id, "user_1");

        let stored = store.get("user_1").await.unwrap();
        assert_eq!(stored.snapshot.hostname, "devbox");
    }

    #[tokio::test]
    async fn resubmit_is_idempotent() {
        let store = InventoryStore::in_memory().await.unwrap();

        let first = store.upsert(&record("user_1", "devbox")).await.unwrap();
        assert!(first.inserted);
        let after_first = store.get("user_1").await.unwrap();

        let second = store.upsert(&record("user_1", "devbox")).await.unwrap();
        assert!(!second.inserted);
        let after_second = store.get("user_1").await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert_eq!(after_first.created_at, after_second.created_at);
        assert!(after_second.updated_at >= after_first.updated_at);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_preserves_created_at() {
        let store = InventoryStore::in_memory().await.unwrap();

        store.upsert(&record("user_1", "old-host")).await.unwrap();
        let before = store.get("user_1").await.unwrap();

        store.upsert(&record("user_1", "new-host")).await.unwrap();
        let after = store.get("user_1").await.unwrap();

        assert_eq!(after.snapshot.hostname, "new-host");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert!(after.updated_at >= after.created_at);
    }

    #[tokio::test]
    async fn concurrent_first_writes_leave_one_record() {
        let store = InventoryStore::in_memory().await.unwrap();

        let a = record("user_1", "host-a");
        let b = record("user_1", "host-b");
        let (ra, rb) = tokio::join!(store.upsert(&a), store.upsert(&b));

        // Neither caller sees a duplicate-key failure.
        ra.unwrap();
        rb.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        // Last committed write wins.
        let hostname = &all[0].snapshot.hostname;
        assert!(hostname == "host-a" || hostname == "host-b");
    }

    #[tokio::test]
    async fn rejected_input_writes_nothing() {
        let store = InventoryStore::in_memory().await.unwrap();

        let mut bad = record("", "devbox");
        let err = store.upsert(&bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        bad.user_id = "user_1".into();
        bad.snapshot.os.clear();
        let err = store.upsert(&bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        // Absent gpu/storage keys are rejected too, not sentinel-filled.
        let mut bad = record("user_1", "devbox");
        bad.snapshot.gpu = None;
        bad.snapshot.storage = None;
        let err = store.upsert(&bad).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m == "missing required fields"));

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_lists_are_stored_as_sentinels() {
        let store = InventoryStore::in_memory().await.unwrap();

        let mut r = record("user_1", "devbox");
        r.snapshot.gpu = Some(Vec::new());
        r.snapshot.storage = Some(Vec::new());
        store.upsert(&r).await.unwrap();

        let stored = store.get("user_1").await.unwrap();
        assert_eq!(stored.snapshot.gpu, Some(vec![GpuAdapter::unknown()]));
        assert_eq!(stored.snapshot.storage, Some(vec![StorageDevice::unknown()]));
    }

    #[tokio::test]
    async fn reads_before_any_write_are_misses() {
        let store = InventoryStore::in_memory().await.unwrap();

        let err = store.get("user_1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_unknown_user_after_writes() {
        let store = InventoryStore::in_memory().await.unwrap();
        store.upsert(&record("user_1", "devbox")).await.unwrap();

        let err = store.get("user_2").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref user_id } if user_id == "user_2"));
    }

    #[tokio::test]
    async fn list_all_orders_newest_first() {
        let store = InventoryStore::in_memory().await.unwrap();
        store.upsert(&record("user_1", "host-1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.upsert(&record("user_2", "host-2")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].user_id, "user_2");
        assert_eq!(all[1].user_id, "user_1");
    }

    #[test]
    fn missing_table_classifier_ignores_non_database_errors() {
        assert!(!is_missing_table(&sqlx::Error::RowNotFound));
        assert!(!is_missing_table(&sqlx::Error::PoolClosed));
    }
}
