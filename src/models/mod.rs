mod cleanup_delay;
mod housekeeping;
mod query;
mod response;

pub use cleanup_delay::*;
pub use housekeeping::*;
pub use query::*;
pub use response::*;
