//! Column decoding shared by the SQL backends.

use crate::{
    db::error::{DbError, DbResult},
    models::{CleanupDelay, HousekeepingStatus, LifecycleEventType},
};

pub const METADATA_COLUMNS: &str = "id, path, database_name, table_name, partition_name, \
     housekeeping_status, creation_timestamp, modified_timestamp, cleanup_timestamp, \
     cleanup_delay, cleanup_attempts, lifecycle_type";

pub const PATH_COLUMNS: &str = "id, path, database_name, table_name, \
     housekeeping_status, creation_timestamp, modified_timestamp, cleanup_timestamp, \
     cleanup_delay, cleanup_attempts, lifecycle_type";

pub fn parse_status(s: &str) -> DbResult<HousekeepingStatus> {
    s.parse().map_err(DbError::Internal)
}

pub fn parse_lifecycle_type(s: &str) -> DbResult<LifecycleEventType> {
    s.parse().map_err(DbError::Internal)
}

pub fn parse_cleanup_delay(s: &str) -> DbResult<CleanupDelay> {
    s.parse()
        .map_err(|e| DbError::Internal(format!("Invalid cleanup_delay in database: {}", e)))
}

pub fn check_attempts(attempts: i32) -> DbResult<i32> {
    if attempts < 0 {
        return Err(DbError::Internal(format!(
            "Negative cleanup_attempts in database: {}",
            attempts
        )));
    }
    Ok(attempts)
}
