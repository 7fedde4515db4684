use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Ticket;

/// Result of applying the validity rules to one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Expired,
    /// Single-use ticket that already has an accepted scan.
    AlreadyUsed,
    /// Identifier not present in the catalog.
    NotFound,
}

/// What the operator is shown. Every rejection reason shares one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Valid,
    ExpiredOrUsed,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn category(self) -> MessageCategory {
        match self {
            Verdict::Valid => MessageCategory::Valid,
            Verdict::Expired | Verdict::AlreadyUsed | Verdict::NotFound => {
                MessageCategory::ExpiredOrUsed
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::Expired => "expired",
            Verdict::AlreadyUsed => "already_used",
            Verdict::NotFound => "not_found",
        }
    }
}

impl MessageCategory {
    pub fn message(self) -> &'static str {
        match self {
            MessageCategory::Valid => "VALID TICKET",
            MessageCategory::ExpiredOrUsed => "EXPIRED OR USED TICKET",
        }
    }
}

/// Decides validity for a looked-up ticket.
///
/// An unknown ticket is rejected. A known ticket is valid up to and including
/// its expiry instant, except that a single-use ticket with any earlier
/// accepted scan is rejected regardless of expiry.
pub fn decide(ticket: Option<&Ticket>, prior_valid_use: bool, now: DateTime<Utc>) -> Verdict {
    let Some(ticket) = ticket else {
        return Verdict::NotFound;
    };

    if ticket.category.is_single_use() && prior_valid_use {
        Verdict::AlreadyUsed
    } else if ticket.is_unexpired_at(now) {
        Verdict::Valid
    } else {
        Verdict::Expired
    }
}

/// Ledger identifier for the scan appended after `ledger_len` existing records.
pub fn scan_id_for(ticket_id: &str, ledger_len: u64) -> String {
    format!("{}-{}", ticket_id, ledger_len + 1)
}
