pub mod scan;
pub mod ticket;

pub use scan::{OperatorId, ScanRecord};
pub use ticket::{Ticket, TicketCategory};
