mod housekeeping;

pub use housekeeping::{SqliteHousekeepingMetadataRepo, SqliteHousekeepingPathRepo};
