use chrono::{DateTime, Utc};

use crate::models::HousekeepingEntity;

/// Record field a predicate can constrain by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TableName,
    DatabaseName,
    HousekeepingStatus,
    LifecycleType,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::TableName => "table_name",
            Field::DatabaseName => "database_name",
            Field::HousekeepingStatus => "housekeeping_status",
            Field::LifecycleType => "lifecycle_type",
        }
    }

    /// Stored text of this field. Enum fields compare by name.
    fn value_of<'a, E: HousekeepingEntity + ?Sized>(&self, record: &'a E) -> &'a str {
        match self {
            Field::TableName => record.table_name(),
            Field::DatabaseName => record.database_name(),
            Field::HousekeepingStatus => record.housekeeping_status().as_str(),
            Field::LifecycleType => record.lifecycle_type().as_str(),
        }
    }
}

/// A composed filter over housekeeping records.
///
/// Predicates are built by conjunction only, and [`Predicate::and`] keeps them
/// flat: an `And` never contains `True` or another `And`, and never has fewer
/// than two terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every record.
    True,
    /// Exact, case-sensitive equality on a field.
    Equals(Field, String),
    /// `cleanup_timestamp` strictly before the instant. Records without a
    /// cleanup timestamp never match.
    CleanupBefore(DateTime<Utc>),
    /// All terms must match.
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn equals(field: Field, value: impl Into<String>) -> Self {
        Predicate::Equals(field, value.into())
    }

    /// Conjunction of two predicates.
    pub fn and(self, other: Predicate) -> Predicate {
        let mut terms = Vec::new();
        for predicate in [self, other] {
            match predicate {
                Predicate::True => {}
                Predicate::And(inner) => terms.extend(inner),
                term => terms.push(term),
            }
        }
        match terms.len() {
            0 => Predicate::True,
            1 => terms.pop().unwrap_or(Predicate::True),
            _ => Predicate::And(terms),
        }
    }

    /// Conjunction of any number of predicates; empty input matches all.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        predicates.into_iter().fold(Predicate::True, Predicate::and)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Predicate::True)
    }

    /// Evaluate against a record in memory.
    pub fn matches<E: HousekeepingEntity + ?Sized>(&self, record: &E) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Equals(field, value) => field.value_of(record) == value,
            Predicate::CleanupBefore(instant) => record
                .cleanup_timestamp()
                .is_some_and(|cleanup| cleanup < *instant),
            Predicate::And(terms) => terms.iter().all(|term| term.matches(record)),
        }
    }
}
