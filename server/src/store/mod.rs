//! Storage for the ticket catalog and the scan ledger.
//!
//! The validator only sees the [`TicketCatalog`] and [`ScanLedger`] traits.
//! [`SqliteStore`] is the durable backend used by the server and
//! [`MemoryStore`] backs tests and embedded use.
//!
//! # Concurrency contract
//!
//! Appends are single-row inserts; the ledger is never rewritten as a whole.
//! Callers that need "read ledger, decide, append" to be atomic must
//! serialise those steps themselves (the validator holds a single-writer
//! guard for this). `scan_id` is unique in both backends, so a colliding
//! append from an unsynchronised writer fails with an error instead of
//! replacing an existing record.

use std::future::Future;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::{ScanRecord, Ticket};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Default number of ledger rows returned by [`ScanLedger::list`].
pub const DEFAULT_LIST_LIMIT: i64 = 100;
/// Upper bound on ledger rows returned by [`ScanLedger::list`].
pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ticket '{ticket_id}' has an unreadable timestamp '{value}'")]
    InvalidTimestamp { ticket_id: String, value: String },

    #[error("scan id '{0}' is already present in the ledger")]
    DuplicateScanId(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read-only view of issued tickets.
pub trait TicketCatalog: Send + Sync {
    /// Exact-match lookup. Absence is `Ok(None)`, not an error.
    fn find_ticket(&self, ticket_id: &str) -> impl Future<Output = Result<Option<Ticket>>> + Send;
}

/// Append-only log of scan attempts.
pub trait ScanLedger: Send + Sync {
    /// True if any record for `ticket_id` was accepted, regardless of position.
    fn has_prior_valid_use(&self, ticket_id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Number of records currently in the ledger.
    fn record_count(&self) -> impl Future<Output = Result<u64>> + Send;

    fn append(&self, record: &ScanRecord) -> impl Future<Output = Result<()>> + Send;

    /// Newest records first.
    fn list(&self, query: &ScanQuery) -> impl Future<Output = Result<Vec<ScanRecord>>> + Send;
}

/// Filter for ledger listings.
#[derive(Debug, Clone, Default)]
pub struct ScanQuery {
    pub ticket_id: Option<String>,
    pub limit: Option<i64>,
}

impl ScanQuery {
    pub fn for_ticket(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: Some(ticket_id.into()),
            limit: None,
        }
    }

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

/// Parses a stored timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// and bare dates (midnight). Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-06-01"), Some(midnight));
        assert_eq!(parse_timestamp("2025-06-01 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-06-01T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2025-06-01T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2025-06-01T02:00:00+02:00"), Some(midnight));
        assert_eq!(
            parse_timestamp("2025-06-01 00:00:00.250000"),
            Some(midnight + chrono::Duration::milliseconds(250))
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("next tuesday"), None);
        assert_eq!(parse_timestamp("2025-13-01"), None);
    }

    #[test]
    fn test_scan_query_limit_is_clamped() {
        assert_eq!(ScanQuery::default().effective_limit(), DEFAULT_LIST_LIMIT);

        let query = ScanQuery {
            ticket_id: None,
            limit: Some(10_000),
        };
        assert_eq!(query.effective_limit(), MAX_LIST_LIMIT);

        let query = ScanQuery {
            ticket_id: None,
            limit: Some(-3),
        };
        assert_eq!(query.effective_limit(), 1);
    }
}
