mod housekeeping;

use std::sync::Arc;

pub use housekeeping::{HousekeepingService, QueryError, QueryResult};

use crate::{config::PaginationConfig, db::DbPool};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub housekeeping: HousekeepingService,
}

impl Services {
    pub fn new(db: Arc<DbPool>, pagination: PaginationConfig) -> Self {
        Self {
            housekeeping: HousekeepingService::from_db(&db, pagination),
        }
    }
}
