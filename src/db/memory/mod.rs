//! In-process record store.
//!
//! Holds records in a `Vec` behind a read-write lock and evaluates predicates
//! with [`Predicate::matches`]. Used by tests and by the `memory` database
//! mode, where records are loaded once from a fixtures file at startup.

use std::{cmp::Ordering, sync::atomic::AtomicI64};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            HousekeepingMetadataRepo, HousekeepingPathRepo, Page, PageRequest, Sort, SortField,
            SortOrder,
        },
    },
    models::{HousekeepingEntity, HousekeepingMetadata, HousekeepingPath},
    specification::Predicate,
};

/// Records keyed by insertion order; ids are assigned on insert.
struct MemoryRecords<T> {
    records: RwLock<Vec<T>>,
    next_id: AtomicI64,
}

impl<T> Default for MemoryRecords<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl<T> MemoryRecords<T>
where
    T: HousekeepingEntity + Clone + Send + Sync,
{
    fn insert_with(&self, mut record: T, set_id: impl FnOnce(&mut T, i64)) -> T {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        set_id(&mut record, id);
        self.records.write().push(record.clone());
        record
    }

    fn count(&self, predicate: &Predicate) -> i64 {
        self.records
            .read()
            .iter()
            .filter(|record| predicate.matches(*record))
            .count() as i64
    }

    fn find_all(&self, predicate: &Predicate, page: &PageRequest) -> Page<T> {
        let records = self.records.read();
        let mut matched: Vec<&T> = records
            .iter()
            .filter(|record| predicate.matches(*record))
            .collect();
        let total = matched.len() as i64;

        let sort = page.sort();
        matched.sort_by(|a, b| {
            sort.map_or(Ordering::Equal, |sort| compare(*a, *b, sort))
                .then_with(|| a.id().cmp(&b.id()))
        });

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(page.size()).unwrap_or(usize::MAX);
        let content = matched
            .into_iter()
            .skip(offset)
            .take(size)
            .cloned()
            .collect();

        Page::new(content, page, total)
    }
}

/// Orders like the SQL backends: enum columns by name, NULLs before values
/// ascending and after them descending.
fn compare<E: HousekeepingEntity>(a: &E, b: &E, sort: Sort) -> Ordering {
    let ordering = match sort.field {
        SortField::Path => a.path().cmp(b.path()),
        SortField::DatabaseName => a.database_name().cmp(b.database_name()),
        SortField::TableName => a.table_name().cmp(b.table_name()),
        SortField::PartitionName => a.partition_name().cmp(&b.partition_name()),
        SortField::HousekeepingStatus => a
            .housekeeping_status()
            .as_str()
            .cmp(b.housekeeping_status().as_str()),
        SortField::CreationTimestamp => a.creation_timestamp().cmp(&b.creation_timestamp()),
        SortField::ModifiedTimestamp => a.modified_timestamp().cmp(&b.modified_timestamp()),
        SortField::CleanupTimestamp => a.cleanup_timestamp().cmp(&b.cleanup_timestamp()),
        SortField::CleanupAttempts => a.cleanup_attempts().cmp(&b.cleanup_attempts()),
        SortField::LifecycleType => a.lifecycle_type().as_str().cmp(b.lifecycle_type().as_str()),
    };
    match sort.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Records loaded into the `memory` store at startup.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixtures {
    #[serde(default)]
    pub metadata: Vec<HousekeepingMetadata>,
    #[serde(default)]
    pub paths: Vec<HousekeepingPath>,
}

impl Fixtures {
    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &str) -> DbResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DbError::Internal(format!("Failed to read fixtures file '{}': {}", path, e))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Default)]
pub struct MemoryHousekeepingMetadataRepo {
    records: MemoryRecords<HousekeepingMetadata>,
}

impl MemoryHousekeepingMetadataRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing its `id` with the next assigned one.
    pub fn insert(&self, record: HousekeepingMetadata) -> HousekeepingMetadata {
        self.records.insert_with(record, |r, id| r.id = id)
    }
}

#[async_trait]
impl HousekeepingMetadataRepo for MemoryHousekeepingMetadataRepo {
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingMetadata>> {
        Ok(self.records.find_all(predicate, page))
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        Ok(self.records.count(predicate))
    }
}

#[derive(Default)]
pub struct MemoryHousekeepingPathRepo {
    records: MemoryRecords<HousekeepingPath>,
}

impl MemoryHousekeepingPathRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing its `id` with the next assigned one.
    pub fn insert(&self, record: HousekeepingPath) -> HousekeepingPath {
        self.records.insert_with(record, |r, id| r.id = id)
    }
}

#[async_trait]
impl HousekeepingPathRepo for MemoryHousekeepingPathRepo {
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingPath>> {
        Ok(self.records.find_all(predicate, page))
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        Ok(self.records.count(predicate))
    }
}
