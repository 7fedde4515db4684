//! Ticket validity decisions and scan bookkeeping.

use thiserror::Error;

use crate::store::StoreError;

pub mod clock;
pub mod payload;
pub mod rules;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use payload::extract_ticket_id;
pub use rules::{decide, scan_id_for, MessageCategory, Verdict};
pub use validator::{ScanOutcome, ScanRequest, Validator};

/// Reasons a scan is refused before any decision is recorded.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no scan input supplied")]
    MissingScanInput,

    #[error("operator identifier is required")]
    MissingOperatorId,

    #[error("no QR code detected in scan input")]
    NoCodeDetected,

    #[error("QR code format not recognized")]
    UnrecognizedPayload,

    #[error(transparent)]
    Storage(#[from] StoreError),
}
