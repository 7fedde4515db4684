use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the scan ledger. Created once per validation attempt and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: String,
    /// May reference a ticket that does not exist in the catalog.
    pub ticket_id: String,
    pub scanned_by: String,
    pub scan_time: DateTime<Utc>,
    pub valid: bool,
}

/// Identifier of the conductor or inspector performing a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperatorId(String);

impl OperatorId {
    /// Returns `None` for missing or blank input.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
