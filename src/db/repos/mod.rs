mod housekeeping;

pub use housekeeping::*;
use serde::Serialize;
use thiserror::Error;

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (oldest first)
    #[default]
    Asc,
    /// Descending order (newest first)
    Desc,
}

impl SortOrder {
    /// Get the SQL ORDER BY direction string.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn from_param(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

/// Record field a page may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Path,
    DatabaseName,
    TableName,
    PartitionName,
    HousekeepingStatus,
    CreationTimestamp,
    ModifiedTimestamp,
    CleanupTimestamp,
    CleanupAttempts,
    LifecycleType,
}

impl SortField {
    /// Fields sortable on metadata records.
    pub const METADATA: &'static [SortField] = &[
        SortField::Path,
        SortField::DatabaseName,
        SortField::TableName,
        SortField::PartitionName,
        SortField::HousekeepingStatus,
        SortField::CreationTimestamp,
        SortField::ModifiedTimestamp,
        SortField::CleanupTimestamp,
        SortField::CleanupAttempts,
        SortField::LifecycleType,
    ];

    /// Fields sortable on path records (no partition column).
    pub const PATH: &'static [SortField] = &[
        SortField::Path,
        SortField::DatabaseName,
        SortField::TableName,
        SortField::HousekeepingStatus,
        SortField::CreationTimestamp,
        SortField::ModifiedTimestamp,
        SortField::CleanupTimestamp,
        SortField::CleanupAttempts,
        SortField::LifecycleType,
    ];

    /// Name used in the `sort` request parameter.
    pub fn param_name(&self) -> &'static str {
        match self {
            SortField::Path => "path",
            SortField::DatabaseName => "databaseName",
            SortField::TableName => "tableName",
            SortField::PartitionName => "partitionName",
            SortField::HousekeepingStatus => "housekeepingStatus",
            SortField::CreationTimestamp => "creationTimestamp",
            SortField::ModifiedTimestamp => "modifiedTimestamp",
            SortField::CleanupTimestamp => "cleanupTimestamp",
            SortField::CleanupAttempts => "cleanupAttempts",
            SortField::LifecycleType => "lifecycleType",
        }
    }

    /// Column name in both SQL schemas.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Path => "path",
            SortField::DatabaseName => "database_name",
            SortField::TableName => "table_name",
            SortField::PartitionName => "partition_name",
            SortField::HousekeepingStatus => "housekeeping_status",
            SortField::CreationTimestamp => "creation_timestamp",
            SortField::ModifiedTimestamp => "modified_timestamp",
            SortField::CleanupTimestamp => "cleanup_timestamp",
            SortField::CleanupAttempts => "cleanup_attempts",
            SortField::LifecycleType => "lifecycle_type",
        }
    }

    fn nullable(&self) -> bool {
        matches!(self, SortField::PartitionName | SortField::CleanupTimestamp)
    }
}

/// Requested ordering of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Parse `field` or `field,asc|desc` against the fields allowed for a
    /// record kind.
    pub fn parse(raw: &str, allowed: &[SortField]) -> Result<Self, InvalidPageRequest> {
        let (name, direction) = match raw.split_once(',') {
            Some((name, direction)) => (name.trim(), Some(direction.trim())),
            None => (raw.trim(), None),
        };

        let field = allowed
            .iter()
            .copied()
            .find(|f| f.param_name() == name)
            .ok_or_else(|| InvalidPageRequest(format!("Cannot sort by '{}'", name)))?;

        let order = match direction {
            Some(d) => SortOrder::from_param(d).ok_or_else(|| {
                InvalidPageRequest(format!(
                    "Sort direction must be 'asc' or 'desc', got '{}'",
                    d
                ))
            })?,
            None => SortOrder::Asc,
        };

        Ok(Self { field, order })
    }

    /// Render the ORDER BY term. NULLs order before any value ascending.
    fn order_by_term(&self) -> String {
        let column = self.field.column();
        let direction = self.order.as_sql();
        if self.field.nullable() {
            let nulls = match self.order {
                SortOrder::Asc => "NULLS FIRST",
                SortOrder::Desc => "NULLS LAST",
            };
            format!("{} {} {}", column, direction, nulls)
        } else {
            format!("{} {}", column, direction)
        }
    }
}

/// The page request could not be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidPageRequest(pub String);

/// A validated page request: zero-based page index, positive size and an
/// optional sort. Results are always tie-broken by `id` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
    offset: i64,
    sort: Option<Sort>,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, sort: Option<Sort>) -> Result<Self, InvalidPageRequest> {
        if page < 0 {
            return Err(InvalidPageRequest(format!(
                "Page index must not be negative, got {}",
                page
            )));
        }
        if size <= 0 {
            return Err(InvalidPageRequest(format!(
                "Page size must be greater than zero, got {}",
                size
            )));
        }
        // Past any real total, so backends answer with an empty page.
        let offset = page.saturating_mul(size);
        Ok(Self {
            page,
            size,
            offset,
            sort,
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    /// ORDER BY clause shared by every SQL backend.
    pub fn order_by_sql(&self) -> String {
        match &self.sort {
            Some(sort) => format!("ORDER BY {}, id ASC", sort.order_by_term()),
            None => "ORDER BY id ASC".to_string(),
        }
    }
}

/// One page of an ordered, filtered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    content: Vec<T>,
    total_elements: i64,
    total_pages: i64,
    page: i64,
    size: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size();
        Self {
            content,
            total_elements,
            total_pages: total_elements / size + i64::from(total_elements % size != 0),
            page: request.page(),
            size,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn total_elements(&self) -> i64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    /// Transform each element, keeping order and page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page: self.page,
            size: self.size,
        }
    }
}
