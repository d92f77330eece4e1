use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use super::ApiError;
use crate::{
    AppState,
    db::Page,
    models::{HousekeepingMetadataResponse, HousekeepingPathResponse, MetadataQuery, PathQuery},
    services::Services,
};

fn services(state: &AppState) -> Result<&Services, ApiError> {
    state
        .services
        .as_ref()
        .ok_or_else(|| ApiError::store_unavailable("No record store is configured"))
}

/// List housekeeping metadata records.
///
/// `GET /api/v1/tables?tableName=&databaseName=&housekeepingStatus=&lifecycleEventType=&deletedBefore=&page=&size=&sort=`
#[tracing::instrument(name = "api.list_metadata", skip(state, query))]
pub async fn list_metadata(
    State(state): State<AppState>,
    query: Result<Query<MetadataQuery>, QueryRejection>,
) -> Result<Json<Page<HousekeepingMetadataResponse>>, ApiError> {
    let Query(query) = query?;
    let page = services(&state)?
        .housekeeping
        .get_all_metadata(query)
        .await?;
    Ok(Json(page))
}

/// List housekeeping path records.
///
/// `GET /api/v1/paths?tableName=&databaseName=&page=&size=&sort=`
#[tracing::instrument(name = "api.list_paths", skip(state, query))]
pub async fn list_paths(
    State(state): State<AppState>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> Result<Json<Page<HousekeepingPathResponse>>, ApiError> {
    let Query(query) = query?;
    let page = services(&state)?.housekeeping.get_all_paths(query).await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::Request};
    use chrono::{TimeZone, Utc};
    use http::StatusCode;
    use tower::ServiceExt;

    use crate::{
        AppState, build_app,
        config::BeekeeperConfig,
        db::{DbPool, memory::Fixtures},
        middleware::REQUEST_ID_HEADER,
        models::{
            CleanupDelay, HousekeepingMetadata, HousekeepingPath, HousekeepingStatus,
            LifecycleEventType,
        },
    };

    fn metadata(
        table_name: &str,
        status: HousekeepingStatus,
        lifecycle: LifecycleEventType,
    ) -> HousekeepingMetadata {
        let created = Utc.with_ymd_and_hms(2021, 5, 1, 9, 0, 0).unwrap();
        HousekeepingMetadata {
            id: 0,
            path: format!("s3://warehouse/some_database/{}", table_name),
            database_name: "some_database".into(),
            table_name: table_name.into(),
            partition_name: None,
            housekeeping_status: status,
            creation_timestamp: created,
            modified_timestamp: created,
            cleanup_timestamp: Some(Utc.with_ymd_and_hms(2021, 5, 4, 9, 0, 0).unwrap()),
            cleanup_delay: CleanupDelay::from_days(3),
            cleanup_attempts: 0,
            lifecycle_type: lifecycle,
        }
    }

    fn path(table_name: &str, suffix: &str) -> HousekeepingPath {
        let created = Utc.with_ymd_and_hms(2021, 5, 1, 9, 0, 0).unwrap();
        HousekeepingPath {
            id: 0,
            path: format!("s3://warehouse/some_database/{}/{}", table_name, suffix),
            database_name: "some_database".into(),
            table_name: table_name.into(),
            housekeeping_status: HousekeepingStatus::Scheduled,
            creation_timestamp: created,
            modified_timestamp: created,
            cleanup_timestamp: None,
            cleanup_delay: CleanupDelay::from_hours(12),
            cleanup_attempts: 1,
            lifecycle_type: LifecycleEventType::Unreferenced,
        }
    }

    fn app_with(fixtures: Fixtures) -> Router {
        let config = BeekeeperConfig::default();
        let state = AppState::with_db(config.clone(), Some(DbPool::from_fixtures(fixtures)));
        build_app(&config, state)
    }

    fn sample_app() -> Router {
        app_with(Fixtures {
            metadata: vec![
                metadata(
                    "bobs_table",
                    HousekeepingStatus::Scheduled,
                    LifecycleEventType::Expired,
                ),
                metadata(
                    "other",
                    HousekeepingStatus::Scheduled,
                    LifecycleEventType::Expired,
                ),
                metadata(
                    "alices_table",
                    HousekeepingStatus::Failed,
                    LifecycleEventType::Unreferenced,
                ),
            ],
            paths: vec![path("bobs_table", "a"), path("other", "b")],
        })
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_filter_by_table_name() {
        let (status, json) = get(&sample_app(), "/api/v1/tables?tableName=bobs_table").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["page"], 0);
        assert_eq!(json["size"], 20);

        let record = &json["content"][0];
        assert_eq!(record["tableName"], "bobs_table");
        assert_eq!(record["databaseName"], "some_database");
        assert_eq!(record["housekeepingStatus"], "SCHEDULED");
        assert_eq!(record["lifecycleType"], "EXPIRED");
        assert_eq!(record["cleanupDelay"], "PT72H");
        assert_eq!(record["cleanupAttempts"], 0);
        assert!(record.get("id").is_none());
    }

    #[tokio::test]
    async fn test_filter_by_lifecycle_event_type() {
        let (status, json) = get(
            &sample_app(),
            "/api/v1/tables?lifecycleEventType=UNREFERENCED",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["content"][0]["tableName"], "alices_table");
    }

    #[tokio::test]
    async fn test_page_out_of_range_is_empty() {
        let app = app_with(Fixtures {
            metadata: vec![metadata(
                "bobs_table",
                HousekeepingStatus::Scheduled,
                LifecycleEventType::Expired,
            )],
            paths: vec![],
        });

        let (status, json) = get(&app, "/api/v1/tables?page=5&size=10").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["content"], serde_json::json!([]));
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["page"], 5);
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected() {
        let request = Request::builder()
            .method("GET")
            .uri("/api/v1/tables?housekeepingStatus=NOT_A_STATUS")
            .header(REQUEST_ID_HEADER, "trace-42")
            .body(Body::empty())
            .unwrap();
        let response = sample_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-42");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "invalid_filter_value");
        assert_eq!(json["error"]["param"], "housekeepingStatus");
        assert_eq!(json["error"]["request_id"], "trace-42");
    }

    #[tokio::test]
    async fn test_malformed_page_is_rejected() {
        let (status, json) = get(&sample_app(), "/api/v1/tables?page=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_query_parameters");
    }

    #[tokio::test]
    async fn test_oversized_page_is_rejected() {
        let (status, json) = get(&sample_app(), "/api/v1/tables?size=2001").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_page_request");
    }

    #[tokio::test]
    async fn test_sorted_listing() {
        let (status, json) = get(&sample_app(), "/api/v1/tables?sort=tableName,desc").await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["tableName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["other", "bobs_table", "alices_table"]);
    }

    #[tokio::test]
    async fn test_empty_params_impose_no_constraint() {
        let (status, json) = get(&sample_app(), "/api/v1/tables?tableName=&databaseName=").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalElements"], 3);
    }

    #[tokio::test]
    async fn test_list_paths() {
        let (status, json) = get(&sample_app(), "/api/v1/paths?tableName=other").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalElements"], 1);
        let record = &json["content"][0];
        assert_eq!(record["path"], "s3://warehouse/some_database/other/b");
        assert_eq!(record["cleanupDelay"], "PT12H");
        assert!(record.get("partitionName").is_none());
    }

    #[tokio::test]
    async fn test_paths_reject_metadata_only_sort() {
        let (status, json) = get(&sample_app(), "/api/v1/paths?sort=partitionName").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_page_request");
    }

    #[tokio::test]
    async fn test_no_store_is_unavailable() {
        let config = BeekeeperConfig::default();
        let app = build_app(&config, AppState::with_db(config.clone(), None));

        let (status, json) = get(&app, "/api/v1/tables").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "store_unavailable");
    }
}
