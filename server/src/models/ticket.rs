use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label prefixes used by the issuance process.
const SINGLE_USE_PREFIX: &str = "Single";
const MULTI_RIDE_PREFIX: &str = "Multi";

/// Fare category of an issued ticket.
///
/// Only [`TicketCategory::SingleUse`] tickets are consumed by their first
/// accepted scan; the other categories stay valid until they expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    SingleUse,
    MultiRide,
    Pass,
}

impl TicketCategory {
    /// Classifies an issuance label such as `Single-Ride` or `Monthly-Pass`.
    pub fn from_label(label: &str) -> Self {
        if label.starts_with(SINGLE_USE_PREFIX) {
            TicketCategory::SingleUse
        } else if label.starts_with(MULTI_RIDE_PREFIX) {
            TicketCategory::MultiRide
        } else {
            TicketCategory::Pass
        }
    }

    pub fn is_single_use(self) -> bool {
        matches!(self, TicketCategory::SingleUse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub ticket_type: String,
    pub category: TicketCategory,
    pub expiry_time: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        ticket_id: impl Into<String>,
        ticket_type: impl Into<String>,
        expiry_time: DateTime<Utc>,
    ) -> Self {
        let ticket_type = ticket_type.into();
        Self {
            ticket_id: ticket_id.into(),
            category: TicketCategory::from_label(&ticket_type),
            ticket_type,
            expiry_time,
        }
    }

    /// A ticket is within its validity window up to and including the expiry instant.
    pub fn is_unexpired_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expiry_time
    }
}
