use std::sync::Arc;

use crate::store::SqliteStore;
use crate::validation::Validator;

#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<Validator<SqliteStore>>,
}

impl AppState {
    pub fn new(validator: Validator<SqliteStore>) -> Self {
        Self {
            validator: Arc::new(validator),
        }
    }
}
