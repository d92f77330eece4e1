use serde::Deserialize;

/// Raw query parameters for listing housekeeping metadata records.
///
/// Values are kept as received; the query service parses and validates them
/// before anything touches the record store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataQuery {
    /// Exact table name
    pub table_name: Option<String>,
    /// Exact database name
    pub database_name: Option<String>,
    /// Status name, e.g. `FAILED`
    pub housekeeping_status: Option<String>,
    /// Event type name, e.g. `UNREFERENCED`
    pub lifecycle_event_type: Option<String>,
    /// RFC 3339 timestamp or zone-less ISO date-time (read as UTC)
    pub deleted_before: Option<String>,
    /// Zero-based page index
    pub page: Option<i64>,
    /// Page size
    pub size: Option<i64>,
    /// `field` or `field,asc|desc`
    pub sort: Option<String>,
}

/// Raw query parameters for listing housekeeping path records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuery {
    pub table_name: Option<String>,
    pub database_name: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}
