//! Observability: structured logging via `tracing-subscriber`, configured
//! from `[observability.logging]`.

mod tracing_init;

pub use tracing_init::*;
