mod housekeeping;

pub use housekeeping::{PostgresHousekeepingMetadataRepo, PostgresHousekeepingPathRepo};
