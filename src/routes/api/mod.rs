mod error;
mod housekeeping;

use axum::{Router, routing::get};
pub use error::{ApiError, ErrorInfo, ErrorResponse};
pub use housekeeping::{list_metadata, list_paths};

use crate::AppState;

/// Listing endpoints, mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tables", get(list_metadata))
        .route("/v1/paths", get(list_paths))
}
