use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};

use crate::{
    db::{
        common::{
            METADATA_COLUMNS, PATH_COLUMNS, check_attempts, parse_cleanup_delay,
            parse_lifecycle_type, parse_status,
        },
        error::DbResult,
        repos::{HousekeepingMetadataRepo, HousekeepingPathRepo, Page, PageRequest},
    },
    models::{HousekeepingMetadata, HousekeepingPath},
    specification::{Predicate, SqlDialect, SqlFilter, SqlValue, predicate_to_sql},
};

fn bind_filter<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    filter: &'q SqlFilter,
) -> Query<'q, Postgres, PgArguments> {
    for value in &filter.bindings {
        query = match value {
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
        };
    }
    query
}

async fn count_in(pool: &PgPool, table: &str, filter: &SqlFilter) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) AS total FROM {} {}", table, filter.where_sql());
    let row = bind_filter(sqlx::query(&sql), filter)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("total")?)
}

async fn fetch_page(
    pool: &PgPool,
    table: &str,
    columns: &str,
    filter: &SqlFilter,
    page: &PageRequest,
) -> DbResult<Vec<PgRow>> {
    // LIMIT/OFFSET placeholders follow the filter's own.
    let limit_idx = filter.bindings.len() + 1;
    let sql = format!(
        "SELECT {} FROM {} {} {} LIMIT ${} OFFSET ${}",
        columns,
        table,
        filter.where_sql(),
        page.order_by_sql(),
        limit_idx,
        limit_idx + 1
    );
    let rows = bind_filter(sqlx::query(&sql), filter)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub struct PostgresHousekeepingMetadataRepo {
    read_pool: PgPool,
}

impl PostgresHousekeepingMetadataRepo {
    /// Listing only reads, so the replica pool is used when configured.
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        Self {
            read_pool: read_pool.unwrap_or(write_pool),
        }
    }

    fn from_row(row: &PgRow) -> DbResult<HousekeepingMetadata> {
        Ok(HousekeepingMetadata {
            id: row.try_get("id")?,
            path: row.try_get("path")?,
            database_name: row.try_get("database_name")?,
            table_name: row.try_get("table_name")?,
            partition_name: row.try_get("partition_name")?,
            housekeeping_status: parse_status(row.try_get::<&str, _>("housekeeping_status")?)?,
            creation_timestamp: row.try_get("creation_timestamp")?,
            modified_timestamp: row.try_get("modified_timestamp")?,
            cleanup_timestamp: row.try_get("cleanup_timestamp")?,
            cleanup_delay: parse_cleanup_delay(row.try_get::<&str, _>("cleanup_delay")?)?,
            cleanup_attempts: check_attempts(row.try_get("cleanup_attempts")?)?,
            lifecycle_type: parse_lifecycle_type(row.try_get::<&str, _>("lifecycle_type")?)?,
        })
    }
}

#[async_trait]
impl HousekeepingMetadataRepo for PostgresHousekeepingMetadataRepo {
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingMetadata>> {
        let filter = predicate_to_sql(predicate, SqlDialect::Postgres);
        let total = count_in(&self.read_pool, "housekeeping_metadata", &filter).await?;
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let rows = fetch_page(
            &self.read_pool,
            "housekeeping_metadata",
            METADATA_COLUMNS,
            &filter,
            page,
        )
        .await?;
        let content = rows
            .iter()
            .map(Self::from_row)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(content, page, total))
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        let filter = predicate_to_sql(predicate, SqlDialect::Postgres);
        count_in(&self.read_pool, "housekeeping_metadata", &filter).await
    }
}

pub struct PostgresHousekeepingPathRepo {
    read_pool: PgPool,
}

impl PostgresHousekeepingPathRepo {
    /// Listing only reads, so the replica pool is used when configured.
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        Self {
            read_pool: read_pool.unwrap_or(write_pool),
        }
    }

    fn from_row(row: &PgRow) -> DbResult<HousekeepingPath> {
        Ok(HousekeepingPath {
            id: row.try_get("id")?,
            path: row.try_get("path")?,
            database_name: row.try_get("database_name")?,
            table_name: row.try_get("table_name")?,
            housekeeping_status: parse_status(row.try_get::<&str, _>("housekeeping_status")?)?,
            creation_timestamp: row.try_get("creation_timestamp")?,
            modified_timestamp: row.try_get("modified_timestamp")?,
            cleanup_timestamp: row.try_get("cleanup_timestamp")?,
            cleanup_delay: parse_cleanup_delay(row.try_get::<&str, _>("cleanup_delay")?)?,
            cleanup_attempts: check_attempts(row.try_get("cleanup_attempts")?)?,
            lifecycle_type: parse_lifecycle_type(row.try_get::<&str, _>("lifecycle_type")?)?,
        })
    }
}

#[async_trait]
impl HousekeepingPathRepo for PostgresHousekeepingPathRepo {
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingPath>> {
        let filter = predicate_to_sql(predicate, SqlDialect::Postgres);
        let total = count_in(&self.read_pool, "housekeeping_path", &filter).await?;
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let rows = fetch_page(
            &self.read_pool,
            "housekeeping_path",
            PATH_COLUMNS,
            &filter,
            page,
        )
        .await?;
        let content = rows
            .iter()
            .map(Self::from_row)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(content, page, total))
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        let filter = predicate_to_sql(predicate, SqlDialect::Postgres);
        count_in(&self.read_pool, "housekeeping_path", &filter).await
    }
}
