pub mod api;
pub mod health;

pub use api::{ApiError, api_routes};
pub use health::health_routes;
