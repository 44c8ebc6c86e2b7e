//! SQL dialect seam: identifier quoting and aggregation wrapping.

use crate::models::Aggregation;

/// Dialects render identifiers and primitive expression pieces.
/// Clause assembly lives in the renderer; the dialect only maps logical
/// constructs to SQL fragments.
pub trait Dialect {
    fn quote_ident(&self, ident: &str) -> String;

    /// Cast applied before summing a boolean column.
    fn bool_to_int(&self, expr: &str) -> String {
        format!("CAST({expr} AS INTEGER)")
    }

    fn render_aggregation(&self, agg: Aggregation, expr: &str, is_boolean: bool) -> String {
        match agg {
            Aggregation::Sum if is_boolean => format!("SUM({})", self.bool_to_int(expr)),
            other => format!("{}({expr})", other.as_sql()),
        }
    }
}

/// Postgres-like SQL. Identifiers are double-quoted only when requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect {
    pub quote_identifiers: bool,
}

impl PostgresDialect {
    pub fn new(quote_identifiers: bool) -> Self {
        Self { quote_identifiers }
    }
}

impl Dialect for PostgresDialect {
    fn quote_ident(&self, ident: &str) -> String {
        if ident == "*" || !self.quote_identifiers {
            return ident.to_string();
        }
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn bool_to_int(&self, expr: &str) -> String {
        format!("{expr}::int")
    }
}
