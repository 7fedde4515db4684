use std::path::Path;
use std::time::Duration;

use chrono::SecondsFormat;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use super::{parse_timestamp, Result, ScanLedger, ScanQuery, StoreError, TicketCatalog};
use crate::models::{ScanRecord, Ticket};

/// File holding both tables inside the data directory.
pub const DATABASE_FILE: &str = "transit.db";

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, FromRow)]
struct TicketRow {
    ticket_id: String,
    ticket_type: String,
    expiry_time: String,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self> {
        let expiry_time =
            parse_timestamp(&row.expiry_time).ok_or_else(|| StoreError::InvalidTimestamp {
                ticket_id: row.ticket_id.clone(),
                value: row.expiry_time.clone(),
            })?;

        Ok(Ticket::new(row.ticket_id, row.ticket_type, expiry_time))
    }
}

#[derive(Debug, FromRow)]
struct ScanRow {
    scan_id: String,
    ticket_id: String,
    scanned_by: String,
    scan_time: String,
    valid: bool,
}

impl TryFrom<ScanRow> for ScanRecord {
    type Error = StoreError;

    fn try_from(row: ScanRow) -> Result<Self> {
        let scan_time =
            parse_timestamp(&row.scan_time).ok_or_else(|| StoreError::InvalidTimestamp {
                ticket_id: row.ticket_id.clone(),
                value: row.scan_time.clone(),
            })?;

        Ok(ScanRecord {
            scan_id: row.scan_id,
            ticket_id: row.ticket_id,
            scanned_by: row.scanned_by,
            scan_time,
            valid: row.valid,
        })
    }
}

/// Catalog and ledger backed by a SQLite database in the data directory.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the data directory and database, then
    /// brings the schema up to date.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let options = SqliteConnectOptions::new()
            .filename(data_dir.join(DATABASE_FILE))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        tracing::info!(path = %data_dir.display(), "Opened ticket database");

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Creates the `tickets` and `scan_logs` tables when absent.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations run successfully");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl TicketCatalog for SqliteStore {
    async fn find_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            "SELECT ticket_id, ticket_type, expiry_time FROM tickets WHERE ticket_id = ?",
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }
}

impl ScanLedger for SqliteStore {
    async fn has_prior_valid_use(&self, ticket_id: &str) -> Result<bool> {
        let used: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM scan_logs WHERE ticket_id = ? AND valid = 1)",
        )
        .bind(ticket_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(used)
    }

    async fn record_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scan_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn append(&self, record: &ScanRecord) -> Result<()> {
        let scan_time = record
            .scan_time
            .to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            "INSERT INTO scan_logs (scan_id, ticket_id, scanned_by, scan_time, valid) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.scan_id)
        .bind(&record.ticket_id)
        .bind(&record.scanned_by)
        .bind(scan_time)
        .bind(record.valid)
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::DuplicateScanId(record.scan_id.clone())
            } else {
                StoreError::Database(err)
            }
        })?;

        Ok(())
    }

    async fn list(&self, query: &ScanQuery) -> Result<Vec<ScanRecord>> {
        let rows = sqlx::query_as::<_, ScanRow>(
            "SELECT scan_id, ticket_id, scanned_by, scan_time, valid FROM scan_logs \
             WHERE (?1 IS NULL OR ticket_id = ?1) \
             ORDER BY rowid DESC LIMIT ?2",
        )
        .bind(query.ticket_id.as_deref())
        .bind(query.effective_limit())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ScanRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    async fn memory_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    async fn insert_ticket(store: &SqliteStore, id: &str, ticket_type: &str, expiry: &str) {
        sqlx::query("INSERT INTO tickets (ticket_id, ticket_type, expiry_time) VALUES (?, ?, ?)")
            .bind(id)
            .bind(ticket_type)
            .bind(expiry)
            .execute(store.pool())
            .await
            .unwrap();
    }

    fn record(scan_id: &str, ticket_id: &str, valid: bool) -> ScanRecord {
        ScanRecord {
            scan_id: scan_id.to_string(),
            ticket_id: ticket_id.to_string(),
            scanned_by: "INSP-7".to_string(),
            scan_time: Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
            valid,
        }
    }

    #[tokio::test]
    async fn test_find_ticket_reads_issued_row() {
        let store = memory_store().await;
        insert_ticket(&store, "T2", "Monthly-Pass", "2025-06-01").await;

        let ticket = store.find_ticket("T2").await.unwrap().unwrap();
        assert_eq!(ticket.ticket_type, "Monthly-Pass");
        assert!(!ticket.category.is_single_use());
        assert_eq!(
            ticket.expiry_time,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );

        assert!(store.find_ticket("T3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_expiry_is_reported() {
        let store = memory_store().await;
        insert_ticket(&store, "BAD", "Single-Ride", "soon").await;

        let err = store.find_ticket("BAD").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTimestamp { ref ticket_id, ref value } if ticket_id == "BAD" && value == "soon"
        ));
    }

    #[tokio::test]
    async fn test_ledger_append_and_usage_history() {
        let store = memory_store().await;
        assert_eq!(store.record_count().await.unwrap(), 0);
        assert!(!store.has_prior_valid_use("T1").await.unwrap());

        store.append(&record("T1-1", "T1", false)).await.unwrap();
        assert!(!store.has_prior_valid_use("T1").await.unwrap());

        store.append(&record("T1-2", "T1", true)).await.unwrap();
        assert!(store.has_prior_valid_use("T1").await.unwrap());
        assert_eq!(store.record_count().await.unwrap(), 2);

        let listed = store.list(&ScanQuery::for_ticket("T1")).await.unwrap();
        assert_eq!(listed[0], record("T1-2", "T1", true));
        assert_eq!(listed[1], record("T1-1", "T1", false));
    }

    #[tokio::test]
    async fn test_duplicate_scan_id_does_not_overwrite() {
        let store = memory_store().await;
        store.append(&record("T1-1", "T1", true)).await.unwrap();

        let err = store.append(&record("T1-1", "T1", false)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateScanId(ref id) if id == "T1-1"));

        let listed = store.list(&ScanQuery::default()).await.unwrap();
        assert_eq!(listed, vec![record("T1-1", "T1", true)]);
    }

    #[tokio::test]
    async fn test_open_creates_directory_and_persists_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("brt_data");

        {
            let store = SqliteStore::open(&data_dir).await.unwrap();
            assert_eq!(store.record_count().await.unwrap(), 0);
            store.append(&record("T9-1", "T9", true)).await.unwrap();
            store.pool().close().await;
        }

        assert!(data_dir.join(DATABASE_FILE).exists());

        let reopened = SqliteStore::open(&data_dir).await.unwrap();
        assert_eq!(reopened.record_count().await.unwrap(), 1);
        assert!(reopened.has_prior_valid_use("T9").await.unwrap());
    }
}
