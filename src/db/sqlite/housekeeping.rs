use async_trait::async_trait;
use sqlx::{
    Row, Sqlite, SqlitePool,
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
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
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    filter: &'q SqlFilter,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in &filter.bindings {
        query = match value {
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
        };
    }
    query
}

async fn count_in(pool: &SqlitePool, table: &str, filter: &SqlFilter) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) AS total FROM {} {}", table, filter.where_sql());
    let row = bind_filter(sqlx::query(&sql), filter)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("total")?)
}

async fn fetch_page(
    pool: &SqlitePool,
    table: &str,
    columns: &str,
    filter: &SqlFilter,
    page: &PageRequest,
) -> DbResult<Vec<SqliteRow>> {
    let sql = format!(
        "SELECT {} FROM {} {} {} LIMIT ? OFFSET ?",
        columns,
        table,
        filter.where_sql(),
        page.order_by_sql()
    );
    let rows = bind_filter(sqlx::query(&sql), filter)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub struct SqliteHousekeepingMetadataRepo {
    pool: SqlitePool,
}

impl SqliteHousekeepingMetadataRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn from_row(row: &SqliteRow) -> DbResult<HousekeepingMetadata> {
        Ok(HousekeepingMetadata {
            id: row.try_get("id")?,
            path: row.try_get("path")?,
            database_name: row.try_get("database_name")?,
            table_name: row.try_get("table_name")?,
            partition_name: row.try_get("partition_name")?,
            housekeeping_status: parse_status(&row.try_get::<String, _>("housekeeping_status")?)?,
            creation_timestamp: row.try_get("creation_timestamp")?,
            modified_timestamp: row.try_get("modified_timestamp")?,
            cleanup_timestamp: row.try_get("cleanup_timestamp")?,
            cleanup_delay: parse_cleanup_delay(&row.try_get::<String, _>("cleanup_delay")?)?,
            cleanup_attempts: check_attempts(row.try_get("cleanup_attempts")?)?,
            lifecycle_type: parse_lifecycle_type(&row.try_get::<String, _>("lifecycle_type")?)?,
        })
    }
}

#[async_trait]
impl HousekeepingMetadataRepo for SqliteHousekeepingMetadataRepo {
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingMetadata>> {
        let filter = predicate_to_sql(predicate, SqlDialect::Sqlite);
        let total = count_in(&self.pool, "housekeeping_metadata", &filter).await?;
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let rows = fetch_page(
            &self.pool,
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
        let filter = predicate_to_sql(predicate, SqlDialect::Sqlite);
        count_in(&self.pool, "housekeeping_metadata", &filter).await
    }
}

pub struct SqliteHousekeepingPathRepo {
    pool: SqlitePool,
}

impl SqliteHousekeepingPathRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn from_row(row: &SqliteRow) -> DbResult<HousekeepingPath> {
        Ok(HousekeepingPath {
            id: row.try_get("id")?,
            path: row.try_get("path")?,
            database_name: row.try_get("database_name")?,
            table_name: row.try_get("table_name")?,
            housekeeping_status: parse_status(&row.try_get::<String, _>("housekeeping_status")?)?,
            creation_timestamp: row.try_get("creation_timestamp")?,
            modified_timestamp: row.try_get("modified_timestamp")?,
            cleanup_timestamp: row.try_get("cleanup_timestamp")?,
            cleanup_delay: parse_cleanup_delay(&row.try_get::<String, _>("cleanup_delay")?)?,
            cleanup_attempts: check_attempts(row.try_get("cleanup_attempts")?)?,
            lifecycle_type: parse_lifecycle_type(&row.try_get::<String, _>("lifecycle_type")?)?,
        })
    }
}

#[async_trait]
impl HousekeepingPathRepo for SqliteHousekeepingPathRepo {
    async fn find_all(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> DbResult<Page<HousekeepingPath>> {
        let filter = predicate_to_sql(predicate, SqlDialect::Sqlite);
        let total = count_in(&self.pool, "housekeeping_path", &filter).await?;
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let rows = fetch_page(&self.pool, "housekeeping_path", PATH_COLUMNS, &filter, page).await?;
        let content = rows
            .iter()
            .map(Self::from_row)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(content, page, total))
    }

    async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
        let filter = predicate_to_sql(predicate, SqlDialect::Sqlite);
        count_in(&self.pool, "housekeeping_path", &filter).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        db::{
            DbError,
            tests::harness::{create_sqlite_pool, run_sqlite_migrations},
        },
        specification::Field,
    };

    async fn create_repo() -> (SqlitePool, SqliteHousekeepingMetadataRepo) {
        let pool = create_sqlite_pool().await;
        run_sqlite_migrations(&pool).await;
        (pool.clone(), SqliteHousekeepingMetadataRepo::new(pool))
    }

    async fn insert_raw(pool: &SqlitePool, table_name: &str, delay: &str) {
        let now = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
        sqlx::query(
            r#"
            INSERT INTO housekeeping_metadata (
                path, database_name, table_name, partition_name, housekeeping_status,
                creation_timestamp, modified_timestamp, cleanup_timestamp,
                cleanup_delay, cleanup_attempts, lifecycle_type
            )
            VALUES (?, 'db', ?, NULL, 'SCHEDULED', ?, ?, NULL, ?, 0, 'EXPIRED')
            "#,
        )
        .bind(format!("s3://bucket/{}", table_name))
        .bind(table_name)
        .bind(now)
        .bind(now)
        .bind(delay)
        .execute(pool)
        .await
        .expect("Failed to insert record");
    }

    #[tokio::test]
    async fn test_reads_iso_delay_column() {
        let (pool, repo) = create_repo().await;
        insert_raw(&pool, "bobs_table", "P3D").await;

        let page = repo
            .find_all(&Predicate::True, &PageRequest::new(0, 10, None).unwrap())
            .await
            .unwrap();

        assert_eq!(page.content().len(), 1);
        assert_eq!(page.content()[0].cleanup_delay.to_string(), "PT72H");
    }

    #[tokio::test]
    async fn test_corrupt_delay_is_an_error() {
        let (pool, repo) = create_repo().await;
        insert_raw(&pool, "bobs_table", "three days").await;

        let result = repo
            .find_all(&Predicate::True, &PageRequest::new(0, 10, None).unwrap())
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_an_error() {
        let (pool, repo) = create_repo().await;
        insert_raw(&pool, "bobs_table", "PT1H").await;
        sqlx::query("UPDATE housekeeping_metadata SET creation_timestamp = 'last tuesday'")
            .execute(&pool)
            .await
            .unwrap();

        let err = repo
            .find_all(&Predicate::True, &PageRequest::new(0, 10, None).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Sqlx(_)), "{:?}", err);
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_equality_uses_binary_collation() {
        let (pool, repo) = create_repo().await;
        insert_raw(&pool, "bobs_table", "PT1H").await;
        insert_raw(&pool, "BOBS_TABLE", "PT1H").await;

        let count = repo
            .count(&Predicate::equals(Field::TableName, "bobs_table"))
            .await
            .unwrap();

        assert_eq!(count, 1);
    }
}
