use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::clock::{Clock, SystemClock};
use super::payload::extract_ticket_id;
use super::rules::{decide, scan_id_for, Verdict};
use super::ScanError;
use crate::models::{OperatorId, ScanRecord};
use crate::store::{ScanLedger, TicketCatalog};

/// Raw input handed over by the scanning front-end.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    pub operator_id: Option<String>,
    /// Decoded QR text. `None` when nothing was captured; empty when the
    /// decoder found no code in the capture.
    pub payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub valid: bool,
    pub verdict: Verdict,
    pub record: ScanRecord,
}

/// Applies the validity rules against a catalog and ledger and records every
/// decision.
///
/// Lookups, the decision and the ledger append for one scan run under a
/// single-writer guard, so scans handled by the same `Validator` never decide
/// against a ledger snapshot that another scan is about to extend.
pub struct Validator<S> {
    store: S,
    clock: Arc<dyn Clock>,
    write_guard: Mutex<()>,
}

impl<S> Validator<S>
where
    S: TicketCatalog + ScanLedger,
{
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_guard: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the operator workflow for one scan: input checks, payload
    /// decoding, then [`Validator::validate`]. Refused input never reaches
    /// the ledger.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        let payload = request
            .payload
            .as_deref()
            .ok_or(ScanError::MissingScanInput)?;

        let operator = OperatorId::parse(request.operator_id.as_deref())
            .ok_or(ScanError::MissingOperatorId)?;

        if payload.trim().is_empty() {
            return Err(ScanError::NoCodeDetected);
        }

        let ticket_id = extract_ticket_id(payload).map_err(|err| {
            tracing::warn!(operator = %operator, "Scan payload not recognized");
            err
        })?;

        self.validate(&ticket_id, &operator).await
    }

    pub async fn validate(
        &self,
        ticket_id: &str,
        operator: &OperatorId,
    ) -> Result<ScanOutcome, ScanError> {
        self.validate_at(ticket_id, operator, self.clock.now()).await
    }

    /// Decides validity of `ticket_id` at `now` and appends the resulting
    /// record. Each call grows the ledger by exactly one record; a storage
    /// failure aborts the scan with nothing recorded.
    pub async fn validate_at(
        &self,
        ticket_id: &str,
        operator: &OperatorId,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, ScanError> {
        let _guard = self.write_guard.lock().await;

        let ticket = self.store.find_ticket(ticket_id).await?;
        let prior_valid_use = match &ticket {
            Some(ticket) if ticket.category.is_single_use() => {
                self.store.has_prior_valid_use(ticket_id).await?
            }
            _ => false,
        };

        let verdict = decide(ticket.as_ref(), prior_valid_use, now);
        let ledger_len = self.store.record_count().await?;

        let record = ScanRecord {
            scan_id: scan_id_for(ticket_id, ledger_len),
            ticket_id: ticket_id.to_string(),
            scanned_by: operator.as_str().to_string(),
            scan_time: now,
            valid: verdict.is_valid(),
        };

        self.store.append(&record).await.map_err(|err| {
            tracing::error!(
                error = %err,
                ticket_id = %ticket_id,
                scan_id = %record.scan_id,
                "Failed to record scan"
            );
            err
        })?;

        if verdict.is_valid() {
            tracing::info!(
                ticket_id = %ticket_id,
                operator = %operator,
                scan_id = %record.scan_id,
                "Ticket accepted"
            );
        } else {
            tracing::info!(
                ticket_id = %ticket_id,
                operator = %operator,
                scan_id = %record.scan_id,
                verdict = verdict.as_str(),
                "Ticket rejected"
            );
        }

        Ok(ScanOutcome {
            valid: record.valid,
            verdict,
            record,
        })
    }
}
