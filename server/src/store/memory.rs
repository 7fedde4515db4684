use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{Result, ScanLedger, ScanQuery, StoreError, TicketCatalog};
use crate::models::{ScanRecord, Ticket};

/// In-process catalog and ledger.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tickets: HashMap<String, Ticket>,
    scans: RwLock<Vec<ScanRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from issued tickets. A later ticket with the same id
    /// replaces an earlier one, keeping ids unique.
    pub fn with_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        Self {
            tickets: tickets
                .into_iter()
                .map(|ticket| (ticket.ticket_id.clone(), ticket))
                .collect(),
            scans: RwLock::new(Vec::new()),
        }
    }

    pub async fn records(&self) -> Vec<ScanRecord> {
        self.scans.read().await.clone()
    }
}

pub(crate) fn has_prior_valid_use(records: &[ScanRecord], ticket_id: &str) -> bool {
    records
        .iter()
        .any(|record| record.valid && record.ticket_id == ticket_id)
}

impl TicketCatalog for MemoryStore {
    async fn find_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>> {
        Ok(self.tickets.get(ticket_id).cloned())
    }
}

impl ScanLedger for MemoryStore {
    async fn has_prior_valid_use(&self, ticket_id: &str) -> Result<bool> {
        Ok(has_prior_valid_use(&self.scans.read().await, ticket_id))
    }

    async fn record_count(&self) -> Result<u64> {
        Ok(self.scans.read().await.len() as u64)
    }

    async fn append(&self, record: &ScanRecord) -> Result<()> {
        let mut scans = self.scans.write().await;
        if scans.iter().any(|existing| existing.scan_id == record.scan_id) {
            return Err(StoreError::DuplicateScanId(record.scan_id.clone()));
        }
        scans.push(record.clone());
        Ok(())
    }

    async fn list(&self, query: &ScanQuery) -> Result<Vec<ScanRecord>> {
        let limit = usize::try_from(query.effective_limit()).unwrap_or(usize::MAX);
        let scans = self.scans.read().await;

        Ok(scans
            .iter()
            .rev()
            .filter(|record| {
                query
                    .ticket_id
                    .as_deref()
                    .map_or(true, |ticket_id| record.ticket_id == ticket_id)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
