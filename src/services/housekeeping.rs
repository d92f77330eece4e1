use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::PaginationConfig,
    db::{
        DbError, DbPool, HousekeepingMetadataRepo, HousekeepingPathRepo, InvalidPageRequest, Page,
        PageRequest, Sort, SortField,
    },
    models::{
        HousekeepingMetadataResponse, HousekeepingPathResponse, MetadataQuery, PathQuery,
        convert_page,
    },
    specification::{FilterCriteria, InvalidFilterValue},
};

/// Why a listing request failed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    InvalidFilterValue(#[from] InvalidFilterValue),

    #[error("Invalid page request: {0}")]
    InvalidPageRequest(#[from] InvalidPageRequest),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(DbError),

    #[error("Record store error: {0}")]
    Store(DbError),
}

impl From<DbError> for QueryError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            QueryError::StoreUnavailable(err)
        } else {
            QueryError::Store(err)
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Filtered, paginated listing of housekeeping records.
///
/// Every request is parsed and validated in full before the store is touched,
/// so malformed input never costs a query.
#[derive(Clone)]
pub struct HousekeepingService {
    metadata: Arc<dyn HousekeepingMetadataRepo>,
    paths: Arc<dyn HousekeepingPathRepo>,
    pagination: PaginationConfig,
}

impl HousekeepingService {
    pub fn new(
        metadata: Arc<dyn HousekeepingMetadataRepo>,
        paths: Arc<dyn HousekeepingPathRepo>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            metadata,
            paths,
            pagination,
        }
    }

    pub fn from_db(db: &DbPool, pagination: PaginationConfig) -> Self {
        Self::new(db.housekeeping_metadata(), db.housekeeping_paths(), pagination)
    }

    /// List metadata records matching every supplied criterion.
    pub async fn get_all_metadata(
        &self,
        query: MetadataQuery,
    ) -> QueryResult<Page<HousekeepingMetadataResponse>> {
        let criteria = FilterCriteria::from_metadata_query(&query)?;
        let page = self.page_request(
            query.page,
            query.size,
            query.sort.as_deref(),
            SortField::METADATA,
        )?;
        let predicate = criteria.build();

        let result = self.metadata.find_all(&predicate, &page).await?;
        tracing::debug!(
            criteria = criteria.active_count(),
            page = page.page(),
            size = page.size(),
            total = result.total_elements(),
            returned = result.content().len(),
            "Listed housekeeping metadata"
        );

        Ok(convert_page(result))
    }

    /// List path records matching the supplied table and database names.
    pub async fn get_all_paths(
        &self,
        query: PathQuery,
    ) -> QueryResult<Page<HousekeepingPathResponse>> {
        let criteria = FilterCriteria::from_path_query(&query);
        let page = self.page_request(
            query.page,
            query.size,
            query.sort.as_deref(),
            SortField::PATH,
        )?;
        let predicate = criteria.build();

        let result = self.paths.find_all(&predicate, &page).await?;
        tracing::debug!(
            criteria = criteria.active_count(),
            page = page.page(),
            size = page.size(),
            total = result.total_elements(),
            returned = result.content().len(),
            "Listed housekeeping paths"
        );

        Ok(convert_page(result))
    }

    fn page_request(
        &self,
        page: Option<i64>,
        size: Option<i64>,
        sort: Option<&str>,
        sortable: &[SortField],
    ) -> Result<PageRequest, InvalidPageRequest> {
        let size = size.unwrap_or(self.pagination.default_page_size);
        if size > self.pagination.max_page_size {
            return Err(InvalidPageRequest(format!(
                "Page size must not exceed {}, got {}",
                self.pagination.max_page_size, size
            )));
        }

        let sort = sort
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Sort::parse(raw, sortable))
            .transpose()?;

        PageRequest::new(page.unwrap_or(0), size, sort)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        db::{
            DbResult,
            memory::{MemoryHousekeepingMetadataRepo, MemoryHousekeepingPathRepo},
        },
        models::{
            CleanupDelay, HousekeepingMetadata, HousekeepingPath, HousekeepingStatus,
            LifecycleEventType,
        },
        specification::Predicate,
    };

    /// Repo that counts calls and always fails; proves rejected requests
    /// never reach the store.
    #[derive(Default)]
    struct CountingRepo {
        calls: AtomicUsize,
    }

    impl CountingRepo {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) -> DbError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DbError::NotConfigured
        }
    }

    #[async_trait]
    impl HousekeepingMetadataRepo for CountingRepo {
        async fn find_all(
            &self,
            _predicate: &Predicate,
            _page: &PageRequest,
        ) -> DbResult<Page<HousekeepingMetadata>> {
            Err(self.record())
        }

        async fn count(&self, _predicate: &Predicate) -> DbResult<i64> {
            Err(self.record())
        }
    }

    #[async_trait]
    impl HousekeepingPathRepo for CountingRepo {
        async fn find_all(
            &self,
            _predicate: &Predicate,
            _page: &PageRequest,
        ) -> DbResult<Page<HousekeepingPath>> {
            Err(self.record())
        }

        async fn count(&self, _predicate: &Predicate) -> DbResult<i64> {
            Err(self.record())
        }
    }

    struct FailingRepo;

    #[async_trait]
    impl HousekeepingMetadataRepo for FailingRepo {
        async fn find_all(
            &self,
            _predicate: &Predicate,
            _page: &PageRequest,
        ) -> DbResult<Page<HousekeepingMetadata>> {
            Err(DbError::Internal("Invalid cleanup_delay in database".into()))
        }

        async fn count(&self, _predicate: &Predicate) -> DbResult<i64> {
            Err(DbError::Internal("Invalid cleanup_delay in database".into()))
        }
    }

    fn counting_service() -> (HousekeepingService, Arc<CountingRepo>) {
        let repo = Arc::new(CountingRepo::default());
        let service =
            HousekeepingService::new(repo.clone(), repo.clone(), PaginationConfig::default());
        (service, repo)
    }

    fn metadata(table_name: &str, status: HousekeepingStatus) -> HousekeepingMetadata {
        let created = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        HousekeepingMetadata {
            id: 0,
            path: format!("s3://bucket/{}", table_name),
            database_name: "some_database".into(),
            table_name: table_name.into(),
            partition_name: None,
            housekeeping_status: status,
            creation_timestamp: created,
            modified_timestamp: created,
            cleanup_timestamp: Some(Utc.with_ymd_and_hms(2021, 5, 4, 0, 0, 0).unwrap()),
            cleanup_delay: CleanupDelay::from_days(3),
            cleanup_attempts: 0,
            lifecycle_type: LifecycleEventType::Expired,
        }
    }

    fn seeded_service(tables: usize) -> HousekeepingService {
        let metadata_repo = MemoryHousekeepingMetadataRepo::new();
        metadata_repo.insert(metadata("bobs_table", HousekeepingStatus::Scheduled));
        for i in 1..tables {
            metadata_repo.insert(metadata(
                &format!("table_{}", i),
                HousekeepingStatus::Failed,
            ));
        }
        HousekeepingService::new(
            Arc::new(metadata_repo),
            Arc::new(MemoryHousekeepingPathRepo::new()),
            PaginationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_invalid_status_never_reaches_store() {
        let (service, repo) = counting_service();

        let err = service
            .get_all_metadata(MetadataQuery {
                housekeeping_status: Some("NOT_A_STATUS".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            QueryError::InvalidFilterValue(e) => {
                assert_eq!(e.field, "housekeepingStatus");
                assert_eq!(e.value, "NOT_A_STATUS");
            }
            other => panic!("expected InvalidFilterValue, got {:?}", other),
        }
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_deleted_before_never_reaches_store() {
        let (service, repo) = counting_service();

        let err = service
            .get_all_metadata(MetadataQuery {
                deleted_before: Some("yesterday".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidFilterValue(_)));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_paging_never_reaches_store() {
        let (service, repo) = counting_service();

        for query in [
            MetadataQuery {
                page: Some(-1),
                ..Default::default()
            },
            MetadataQuery {
                size: Some(0),
                ..Default::default()
            },
            MetadataQuery {
                size: Some(2001),
                ..Default::default()
            },
            MetadataQuery {
                sort: Some("owner".into()),
                ..Default::default()
            },
            MetadataQuery {
                sort: Some("tableName,sideways".into()),
                ..Default::default()
            },
        ] {
            let err = service.get_all_metadata(query).await.unwrap_err();
            assert!(matches!(err, QueryError::InvalidPageRequest(_)), "{:?}", err);
        }

        let err = service
            .get_all_paths(PathQuery {
                sort: Some("partitionName".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidPageRequest(_)));

        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let (service, repo) = counting_service();

        let err = service
            .get_all_paths(PathQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::StoreUnavailable(_)));
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_store_is_store_error() {
        let service = HousekeepingService::new(
            Arc::new(FailingRepo),
            Arc::new(MemoryHousekeepingPathRepo::new()),
            PaginationConfig::default(),
        );

        let err = service
            .get_all_metadata(MetadataQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::Store(_)));
    }

    #[tokio::test]
    async fn test_defaults_apply_when_paging_absent() {
        let service = seeded_service(25);

        let page = service
            .get_all_metadata(MetadataQuery::default())
            .await
            .unwrap();

        assert_eq!(page.page(), 0);
        assert_eq!(page.size(), 20);
        assert_eq!(page.content().len(), 20);
        assert_eq!(page.total_elements(), 25);
        assert_eq!(page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_table_name_filter_converts_records() {
        let service = seeded_service(3);

        let page = service
            .get_all_metadata(MetadataQuery {
                table_name: Some("bobs_table".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_elements(), 1);
        let record = &page.content()[0];
        assert_eq!(record.table_name, "bobs_table");
        assert_eq!(record.cleanup_delay.to_string(), "PT72H");
    }

    #[tokio::test]
    async fn test_page_out_of_range_is_empty() {
        let service = seeded_service(3);

        let page = service
            .get_all_metadata(MetadataQuery {
                page: Some(5),
                size: Some(20),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.content().is_empty());
        assert_eq!(page.total_elements(), 3);
    }

    #[tokio::test]
    async fn test_huge_page_index_is_empty() {
        let service = seeded_service(3);

        let page = service
            .get_all_metadata(MetadataQuery {
                page: Some(i64::MAX / 10),
                size: Some(20),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.content().is_empty());
        assert_eq!(page.page(), i64::MAX / 10);
        assert_eq!(page.total_elements(), 3);
        assert_eq!(page.total_pages(), 1);
    }

    #[tokio::test]
    async fn test_blank_sort_is_ignored() {
        let service = seeded_service(2);

        let page = service
            .get_all_metadata(MetadataQuery {
                sort: Some("  ".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_elements(), 2);
    }

    #[tokio::test]
    async fn test_max_page_size_is_accepted() {
        let service = seeded_service(1);

        let page = service
            .get_all_metadata(MetadataQuery {
                size: Some(2000),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.size(), 2000);
    }
}
