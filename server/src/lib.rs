//! Transit ticket validation: decides whether a scanned ticket is currently
//! valid and keeps an append-only ledger of every scan.

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;
