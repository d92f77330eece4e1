use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CleanupDelay;

/// Lifecycle state of a housekeeping record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HousekeepingStatus {
    /// Waiting for its cleanup timestamp to pass
    Scheduled,
    /// The last cleanup attempt failed
    Failed,
    /// Cleanup completed
    Deleted,
    /// Cleanup switched off for the owning table
    Disabled,
    /// Intentionally passed over by the cleanup run
    Skipped,
    /// The deletion itself failed
    FailedToDelete,
    /// The record could not be scheduled
    FailedToSchedule,
}

impl HousekeepingStatus {
    pub const ALL: [HousekeepingStatus; 7] = [
        HousekeepingStatus::Scheduled,
        HousekeepingStatus::Failed,
        HousekeepingStatus::Deleted,
        HousekeepingStatus::Disabled,
        HousekeepingStatus::Skipped,
        HousekeepingStatus::FailedToDelete,
        HousekeepingStatus::FailedToSchedule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HousekeepingStatus::Scheduled => "SCHEDULED",
            HousekeepingStatus::Failed => "FAILED",
            HousekeepingStatus::Deleted => "DELETED",
            HousekeepingStatus::Disabled => "DISABLED",
            HousekeepingStatus::Skipped => "SKIPPED",
            HousekeepingStatus::FailedToDelete => "FAILED_TO_DELETE",
            HousekeepingStatus::FailedToSchedule => "FAILED_TO_SCHEDULE",
        }
    }
}

impl std::fmt::Display for HousekeepingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HousekeepingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid housekeeping status: {}", s))
    }
}

/// Reason a record was scheduled for cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEventType {
    /// The table's retention period elapsed
    Expired,
    /// The path is no longer referenced by any table or partition
    Unreferenced,
}

impl LifecycleEventType {
    pub const ALL: [LifecycleEventType; 2] =
        [LifecycleEventType::Expired, LifecycleEventType::Unreferenced];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEventType::Expired => "EXPIRED",
            LifecycleEventType::Unreferenced => "UNREFERENCED",
        }
    }
}

impl std::fmt::Display for LifecycleEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LifecycleEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXPIRED" => Ok(LifecycleEventType::Expired),
            "UNREFERENCED" => Ok(LifecycleEventType::Unreferenced),
            _ => Err(format!("Invalid lifecycle event type: {}", s)),
        }
    }
}

/// Read access shared by both housekeeping record kinds.
///
/// Predicates and in-memory sorting are written against this trait so the
/// same filter evaluates identically over metadata and path records.
pub trait HousekeepingEntity {
    fn id(&self) -> i64;
    fn path(&self) -> &str;
    fn database_name(&self) -> &str;
    fn table_name(&self) -> &str;
    /// Path records never carry a partition.
    fn partition_name(&self) -> Option<&str> {
        None
    }
    fn housekeeping_status(&self) -> HousekeepingStatus;
    fn creation_timestamp(&self) -> DateTime<Utc>;
    fn modified_timestamp(&self) -> DateTime<Utc>;
    fn cleanup_timestamp(&self) -> Option<DateTime<Utc>>;
    fn cleanup_delay(&self) -> CleanupDelay;
    fn cleanup_attempts(&self) -> i32;
    fn lifecycle_type(&self) -> LifecycleEventType;
}

/// A table or partition scheduled for housekeeping.
///
/// Equality ignores the store-assigned `id` and the three timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingMetadata {
    /// Store-assigned surrogate key, used only to order results stably
    #[serde(default)]
    pub id: i64,
    /// Storage location of the table or partition
    pub path: String,
    pub database_name: String,
    pub table_name: String,
    /// Absent for whole-table records
    pub partition_name: Option<String>,
    pub housekeeping_status: HousekeepingStatus,
    /// Set once when the record is created
    pub creation_timestamp: DateTime<Utc>,
    /// Updated on every mutation by the writer
    pub modified_timestamp: DateTime<Utc>,
    /// When the record becomes eligible for cleanup
    pub cleanup_timestamp: Option<DateTime<Utc>>,
    pub cleanup_delay: CleanupDelay,
    pub cleanup_attempts: i32,
    pub lifecycle_type: LifecycleEventType,
}

impl PartialEq for HousekeepingMetadata {
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

impl Eq for HousekeepingMetadata {}

impl HousekeepingEntity for HousekeepingMetadata {
    fn id(&self) -> i64 {
        self.id
    }
    fn path(&self) -> &str {
        &self.path
    }
    fn database_name(&self) -> &str {
        &self.database_name
    }
    fn table_name(&self) -> &str {
        &self.table_name
    }
    fn partition_name(&self) -> Option<&str> {
        self.partition_name.as_deref()
    }
    fn housekeeping_status(&self) -> HousekeepingStatus {
        self.housekeeping_status
    }
    fn creation_timestamp(&self) -> DateTime<Utc> {
        self.creation_timestamp
    }
    fn modified_timestamp(&self) -> DateTime<Utc> {
        self.modified_timestamp
    }
    fn cleanup_timestamp(&self) -> Option<DateTime<Utc>> {
        self.cleanup_timestamp
    }
    fn cleanup_delay(&self) -> CleanupDelay {
        self.cleanup_delay
    }
    fn cleanup_attempts(&self) -> i32 {
        self.cleanup_attempts
    }
    fn lifecycle_type(&self) -> LifecycleEventType {
        self.lifecycle_type
    }
}

/// An orphaned storage path scheduled for housekeeping.
///
/// Equality ignores the store-assigned `id` and the three timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingPath {
    /// Store-assigned surrogate key, used only to order results stably
    #[serde(default)]
    pub id: i64,
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

impl PartialEq for HousekeepingPath {
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

impl Eq for HousekeepingPath {}

impl HousekeepingEntity for HousekeepingPath {
    fn id(&self) -> i64 {
        self.id
    }
    fn path(&self) -> &str {
        &self.path
    }
    fn database_name(&self) -> &str {
        &self.database_name
    }
    fn table_name(&self) -> &str {
        &self.table_name
    }
    fn housekeeping_status(&self) -> HousekeepingStatus {
        self.housekeeping_status
    }
    fn creation_timestamp(&self) -> DateTime<Utc> {
        self.creation_timestamp
    }
    fn modified_timestamp(&self) -> DateTime<Utc> {
        self.modified_timestamp
    }
    fn cleanup_timestamp(&self) -> Option<DateTime<Utc>> {
        self.cleanup_timestamp
    }
    fn cleanup_delay(&self) -> CleanupDelay {
        self.cleanup_delay
    }
    fn cleanup_attempts(&self) -> i32 {
        self.cleanup_attempts
    }
    fn lifecycle_type(&self) -> LifecycleEventType {
        self.lifecycle_type
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn metadata() -> HousekeepingMetadata {
        let created = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap();
        HousekeepingMetadata {
            id: 1,
            path: "s3://bucket/warehouse/bobs_table/dt=2021-05-01".to_string(),
            database_name: "some_database".to_string(),
            table_name: "bobs_table".to_string(),
            partition_name: Some("dt=2021-05-01".to_string()),
            housekeeping_status: HousekeepingStatus::Scheduled,
            creation_timestamp: created,
            modified_timestamp: created,
            cleanup_timestamp: Some(created + chrono::Duration::days(3)),
            cleanup_delay: CleanupDelay::from_days(3),
            cleanup_attempts: 0,
            lifecycle_type: LifecycleEventType::Expired,
        }
    }

    #[test]
    fn test_status_round_trips_by_name() {
        for status in HousekeepingStatus::ALL {
            assert_eq!(status.to_string().parse::<HousekeepingStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_status_names_are_case_sensitive() {
        assert!("failed".parse::<HousekeepingStatus>().is_err());
        assert!("NOT_A_STATUS".parse::<HousekeepingStatus>().is_err());
        assert_eq!(
            "FAILED_TO_DELETE".parse::<HousekeepingStatus>(),
            Ok(HousekeepingStatus::FailedToDelete)
        );
    }

    #[test]
    fn test_lifecycle_type_parse() {
        assert_eq!(
            "UNREFERENCED".parse::<LifecycleEventType>(),
            Ok(LifecycleEventType::Unreferenced)
        );
        assert!("Unreferenced".parse::<LifecycleEventType>().is_err());
    }

    #[test]
    fn test_enum_serde_uses_names() {
        let json = serde_json::to_string(&HousekeepingStatus::FailedToSchedule).unwrap();
        assert_eq!(json, "\"FAILED_TO_SCHEDULE\"");
        let json = serde_json::to_string(&LifecycleEventType::Expired).unwrap();
        assert_eq!(json, "\"EXPIRED\"");
    }

    #[test]
    fn test_equality_ignores_timestamps_and_id() {
        let a = metadata();
        let mut b = a.clone();
        b.id = 99;
        b.creation_timestamp = Utc::now();
        b.modified_timestamp = Utc::now();
        b.cleanup_timestamp = None;
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_compares_identity_fields() {
        let a = metadata();
        let mut b = a.clone();
        b.partition_name = None;
        assert_ne!(a, b);

        let mut c = a.clone();
        c.cleanup_attempts = 1;
        assert_ne!(a, c);
    }

    #[test]
    fn test_path_record_has_no_partition() {
        let m = metadata();
        let path = HousekeepingPath {
            id: m.id,
            path: m.path.clone(),
            database_name: m.database_name.clone(),
            table_name: m.table_name.clone(),
            housekeeping_status: m.housekeeping_status,
            creation_timestamp: m.creation_timestamp,
            modified_timestamp: m.modified_timestamp,
            cleanup_timestamp: m.cleanup_timestamp,
            cleanup_delay: m.cleanup_delay,
            cleanup_attempts: m.cleanup_attempts,
            lifecycle_type: m.lifecycle_type,
        };
        assert_eq!(HousekeepingEntity::partition_name(&path), None);
        assert_eq!(
            HousekeepingEntity::partition_name(&m),
            Some("dt=2021-05-01")
        );
    }
}
