//! Response shapes returned by the listing endpoints.
//!
//! Conversion is purely structural: one response per record, order kept,
//! enums by name and the cleanup delay in its ISO-8601 text form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CleanupDelay, HousekeepingMetadata, HousekeepingPath, HousekeepingStatus, LifecycleEventType,
};
use crate::db::Page;

/// A metadata record as returned to clients.
///
/// Equality ignores the three timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousekeepingMetadataResponse {
    pub path: String,
    pub database_name: String,
    pub table_name: String,
    pub partition_name: Option<String>,
    pub housekeeping_status: HousekeepingStatus,
    pub creation_timestamp: DateTime<Utc>,
    pub modified_timestamp: DateTime<Utc>,
    pub cleanup_timestamp: Option<DateTime<Utc>>,
    pub cleanup_delay: CleanupDelay,
    pub cleanup_attempts: i32,
    pub lifecycle_type: LifecycleEventType,
}

impl PartialEq for HousekeepingMetadataResponse {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.database_name == other.database_name
            && self.table_name == other.table_name
            && self.partition_name == other.partition_name
            && self.housekeeping_status == other.housekeeping_status
            && self.cleanup_delay == other.cleanup_delay
            && self.cleanup_attempts == other.cleanup_attempts
            && self.lifecycle_type == other.lifecycle_type
    }
}

impl Eq for HousekeepingMetadataResponse {}

impl From<HousekeepingMetadata> for HousekeepingMetadataResponse {
    fn from(record: HousekeepingMetadata) -> Self {
        Self {
            path: record.path,
            database_name: record.database_name,
            table_name: record.table_name,
            partition_name: record.partition_name,
            housekeeping_status: record.housekeeping_status,
            creation_timestamp: record.creation_timestamp,
            modified_timestamp: record.modified_timestamp,
            cleanup_timestamp: record.cleanup_timestamp,
            cleanup_delay: record.cleanup_delay,
            cleanup_attempts: record.cleanup_attempts,
            lifecycle_type: record.lifecycle_type,
        }
    }
}

/// A path record as returned to clients.
///
/// Equality ignores the three timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousekeepingPathResponse {
    pub path: String,
    pub database_name: String,
    pub table_name: String,
    pub housekeeping_status: HousekeepingStatus,
    pub creation_timestamp: DateTime<Utc>,
    pub modified_timestamp: DateTime<Utc>,
    pub cleanup_timestamp: Option<DateTime<Utc>>,
    pub cleanup_delay: CleanupDelay,
    pub cleanup_attempts: i32,
    pub lifecycle_type: LifecycleEventType,
}

impl PartialEq for HousekeepingPathResponse {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.database_name == other.database_name
            && self.table_name == other.table_name
            && self.housekeeping_status == other.housekeeping_status
            && self.cleanup_delay == other.cleanup_delay
            && self.cleanup_attempts == other.cleanup_attempts
            && self.lifecycle_type == other.lifecycle_type
    }
}

impl Eq for HousekeepingPathResponse {}

impl From<HousekeepingPath> for HousekeepingPathResponse {
    fn from(record: HousekeepingPath) -> Self {
        Self {
            path: record.path,
            database_name: record.database_name,
            table_name: record.table_name,
            housekeeping_status: record.housekeeping_status,
            creation_timestamp: record.creation_timestamp,
            modified_timestamp: record.modified_timestamp,
            cleanup_timestamp: record.cleanup_timestamp,
            cleanup_delay: record.cleanup_delay,
            cleanup_attempts: record.cleanup_attempts,
            lifecycle_type: record.lifecycle_type,
        }
    }
}

/// Convert a single record into its response shape.
pub fn convert<R, T>(record: R) -> T
where
    T: From<R>,
{
    T::from(record)
}

/// Convert every record of a page, keeping order and page metadata.
pub fn convert_page<R, T>(page: Page<R>) -> Page<T>
where
    T: From<R>,
{
    page.map(T::from)
}
