use chrono::{DateTime, Utc};

use super::Predicate;

/// Placeholder syntax of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// `?`
    Sqlite,
    /// `$1`, `$2`, ...
    Postgres,
}

/// Result of converting a predicate to SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    /// WHERE clause fragment without the `WHERE` keyword; empty when the
    /// predicate matches everything
    pub where_clause: String,
    /// Bind values in order
    pub bindings: Vec<SqlValue>,
}

impl SqlFilter {
    /// `WHERE ...`, or an empty string for an unconstrained predicate.
    pub fn where_sql(&self) -> String {
        if self.where_clause.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.where_clause)
        }
    }
}

/// SQL bind value types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Convert a predicate to a parameterised WHERE fragment.
///
/// Column names come from [`super::Field::column`]; values are always bound.
pub fn predicate_to_sql(predicate: &Predicate, dialect: SqlDialect) -> SqlFilter {
    if predicate.is_true() {
        return SqlFilter {
            where_clause: String::new(),
            bindings: Vec::new(),
        };
    }
    let mut ctx = TranslationContext::new(dialect);
    let where_clause = ctx.translate(predicate);
    SqlFilter {
        where_clause,
        bindings: ctx.bindings,
    }
}

struct TranslationContext {
    dialect: SqlDialect,
    bindings: Vec<SqlValue>,
}

impl TranslationContext {
    fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            bindings: Vec::new(),
        }
    }

    /// Add a binding and return its placeholder.
    fn add_binding(&mut self, value: SqlValue) -> String {
        self.bindings.push(value);
        match self.dialect {
            SqlDialect::Sqlite => "?".to_string(),
            SqlDialect::Postgres => format!("${}", self.bindings.len()),
        }
    }

    fn translate(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::True => "1 = 1".to_string(),
            Predicate::Equals(field, value) => {
                let placeholder = self.add_binding(SqlValue::Text(value.clone()));
                format!("{} = {}", field.column(), placeholder)
            }
            Predicate::CleanupBefore(instant) => {
                let placeholder = self.add_binding(SqlValue::Timestamp(*instant));
                format!("cleanup_timestamp < {}", placeholder)
            }
            Predicate::And(terms) => {
                let clauses: Vec<String> = terms.iter().map(|term| self.translate(term)).collect();
                format!("({})", clauses.join(" AND "))
            }
        }
    }
}
