use async_trait::async_trait;

use super::{Page, PageRequest};
use crate::{
    db::error::DbResult,
    models::{HousekeepingMetadata, HousekeepingPath},
    specification::Predicate,
};

/// Read access to housekeeping metadata records (tables and partitions).
///
/// Implementations never mutate the store.
#[async_trait]
pub trait HousekeepingMetadataRepo: Send + Sync {
    /// Return one page of the records matching `predicate`, ordered by the
    /// request's sort and then by `id` ascending. `total_elements` counts the
    /// whole filtered set, so a page past the end is empty but still reports
    /// the total.
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingMetadata>>;

    /// Count the records matching `predicate`.
    async fn count(&self, predicate: &Predicate) -> DbResult<i64>;
}

/// Read access to orphaned housekeeping path records.
#[async_trait]
pub trait HousekeepingPathRepo: Send + Sync {
    /// See [`HousekeepingMetadataRepo::find_all`].
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingPath>>;

    async fn count(&self, predicate: &Predicate) -> DbResult<i64>;
}
