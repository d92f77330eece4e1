use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use super::{Field, Predicate};
use crate::models::{HousekeepingStatus, LifecycleEventType, MetadataQuery, PathQuery};

/// A filter parameter carried a value outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value '{value}' for filter '{field}'")]
pub struct InvalidFilterValue {
    /// Request parameter name, e.g. `housekeepingStatus`
    pub field: &'static str,
    pub value: String,
}

/// Optional, independently specified filter criteria.
///
/// Absent fields impose no constraint; present fields combine conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub table_name: Option<String>,
    pub database_name: Option<String>,
    pub housekeeping_status: Option<HousekeepingStatus>,
    pub lifecycle_event_type: Option<LifecycleEventType>,
    pub deleted_before: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    /// Parse the raw metadata listing parameters. Enum names are matched
    /// exactly (`FAILED`, not `failed`). Empty strings count as absent.
    pub fn from_metadata_query(query: &MetadataQuery) -> Result<Self, InvalidFilterValue> {
        let housekeeping_status = present(&query.housekeeping_status)
            .map(|raw| {
                raw.parse::<HousekeepingStatus>()
                    .map_err(|_| invalid("housekeepingStatus", raw))
            })
            .transpose()?;

        let lifecycle_event_type = present(&query.lifecycle_event_type)
            .map(|raw| {
                raw.parse::<LifecycleEventType>()
                    .map_err(|_| invalid("lifecycleEventType", raw))
            })
            .transpose()?;

        let deleted_before = present(&query.deleted_before)
            .map(parse_deleted_before)
            .transpose()?;

        Ok(Self {
            table_name: present(&query.table_name).map(str::to_string),
            database_name: present(&query.database_name).map(str::to_string),
            housekeeping_status,
            lifecycle_event_type,
            deleted_before,
        })
    }

    /// Path listings only filter by table and database name.
    pub fn from_path_query(query: &PathQuery) -> Self {
        Self {
            table_name: present(&query.table_name).map(str::to_string),
            database_name: present(&query.database_name).map(str::to_string),
            ..Self::default()
        }
    }

    /// Number of criteria that constrain the result.
    pub fn active_count(&self) -> usize {
        [
            self.table_name.is_some(),
            self.database_name.is_some(),
            self.housekeeping_status.is_some(),
            self.lifecycle_event_type.is_some(),
            self.deleted_before.is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Compose the criteria into a single predicate.
    pub fn build(&self) -> Predicate {
        let mut terms = Vec::with_capacity(self.active_count());
        if let Some(table_name) = &self.table_name {
            terms.push(Predicate::equals(Field::TableName, table_name.as_str()));
        }
        if let Some(database_name) = &self.database_name {
            terms.push(Predicate::equals(Field::DatabaseName, database_name.as_str()));
        }
        if let Some(status) = self.housekeeping_status {
            terms.push(Predicate::equals(Field::HousekeepingStatus, status.as_str()));
        }
        if let Some(lifecycle) = self.lifecycle_event_type {
            terms.push(Predicate::equals(Field::LifecycleType, lifecycle.as_str()));
        }
        if let Some(deleted_before) = self.deleted_before {
            terms.push(Predicate::CleanupBefore(deleted_before));
        }
        Predicate::all(terms)
    }
}

/// Parse a `deletedBefore` value.
///
/// Accepts RFC 3339 (`2021-05-05T10:41:20Z`), a zone-less ISO date-time
/// (`2021-05-05T10:41:20`) or a bare date (`2021-05-05`, midnight). Zone-less
/// values are read as UTC.
pub fn parse_deleted_before(raw: &str) -> Result<DateTime<Utc>, InvalidFilterValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| invalid("deletedBefore", raw))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn invalid(field: &'static str, value: &str) -> InvalidFilterValue {
    InvalidFilterValue {
        field,
        value: value.to_string(),
    }
}
