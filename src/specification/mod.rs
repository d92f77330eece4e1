//! Filter specifications for housekeeping listings.
//!
//! Optional request criteria are parsed into [`FilterCriteria`], composed into
//! a single [`Predicate`], and then either evaluated in memory
//! ([`Predicate::matches`]) or translated to a parameterised SQL WHERE clause
//! ([`predicate_to_sql`]). Both paths must agree on every record:
//!
//! - string equality is exact and case-sensitive
//! - enum fields compare by their upper-case name
//! - `deletedBefore` is a strict `<` on `cleanup_timestamp`, and records with
//!   no cleanup timestamp never match

mod criteria;
mod predicate;
mod to_sql;

pub use criteria::{FilterCriteria, InvalidFilterValue, parse_deleted_before};
pub use predicate::{Field, Predicate};
pub use to_sql::{SqlDialect, SqlFilter, SqlValue, predicate_to_sql};
