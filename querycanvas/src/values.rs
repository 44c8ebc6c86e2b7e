//! Type-aware rendering of user-entered filter values as SQL literals.
//!
//! Escaping is driven by the column's declared `data_type`. Anything that does
//! not fit the declared type falls back to a quoted string literal.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("static regex is valid"));

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([ T]\d{2}:\d{2}(:\d{2}(\.\d+)?)?)?$").expect("static regex is valid")
});

static DMY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("static regex is valid"));

/// Broad type families the escaper distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Numeric,
    Temporal,
    Array,
    Text,
}

impl ValueKind {
    /// Classify a declared column type. Unknown types are treated as text.
    pub fn from_data_type(data_type: &str) -> Self {
        let ty = data_type.trim().to_ascii_lowercase();
        if ty.ends_with("[]") || ty == "array" || ty.starts_with("_") {
            return ValueKind::Array;
        }
        match ty.as_str() {
            "boolean" | "bool" => ValueKind::Boolean,
            "integer" | "int" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "serial"
            | "bigserial" | "smallserial" | "real" | "float" | "float4" | "float8"
            | "double precision" | "money" => ValueKind::Numeric,
            _ if ty.starts_with("numeric") || ty.starts_with("decimal") => ValueKind::Numeric,
            _ if ty.starts_with("timestamp") || ty.starts_with("date") => ValueKind::Temporal,
            _ => ValueKind::Text,
        }
    }
}

/// Single-quote a string, doubling embedded quotes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQL functions accepted verbatim in place of a date literal.
pub fn is_date_function(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_uppercase().as_str(),
        "NOW()" | "CURRENT_DATE" | "CURRENT_TIMESTAMP"
    )
}

/// Normalize `YYYY-MM-DD[ time]` or `DD/MM/YYYY` to ISO. `None` when the
/// input is neither or names an impossible day/month.
pub fn normalize_date(value: &str) -> Option<String> {
    let value = value.trim();
    if ISO_DATE.is_match(value) {
        return Some(value.to_string());
    }
    let caps = DMY_DATE.captures(value)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    Some(format!("{}-{month:02}-{day:02}", &caps[3]))
}

/// Render one scalar value for a column of `kind`.
pub fn escape_scalar(value: &str, kind: ValueKind) -> String {
    let trimmed = value.trim();
    match kind {
        ValueKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => "true".to_string(),
            "false" | "f" | "0" | "no" | "n" => "false".to_string(),
            _ => quote_string(value),
        },
        ValueKind::Numeric if NUMBER.is_match(trimmed) => trimmed.to_string(),
        ValueKind::Temporal => {
            if is_date_function(trimmed) {
                return trimmed.to_string();
            }
            match normalize_date(trimmed) {
                Some(iso) => quote_string(&iso),
                None => quote_string(value),
            }
        }
        ValueKind::Array => {
            let items: Vec<String> = split_list(value).map(quote_string).collect();
            format!("ARRAY[{}]", items.join(", "))
        }
        _ => quote_string(value),
    }
}

/// Render a comma-separated value as a parenthesized list for `IN`.
pub fn escape_list(value: &str, kind: ValueKind) -> String {
    let item_kind = match kind {
        ValueKind::Array => ValueKind::Text,
        other => other,
    };
    let items: Vec<String> = split_list(value)
        .map(|item| escape_scalar(item, item_kind))
        .collect();
    format!("({})", items.join(", "))
}

/// Escape `value` for a column declared as `data_type`.
pub fn escape_value(value: &str, data_type: Option<&str>) -> String {
    let kind = data_type.map_or(ValueKind::Text, ValueKind::from_data_type);
    escape_scalar(value, kind)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_postgres_types() {
        assert_eq!(ValueKind::from_data_type("integer"), ValueKind::Numeric);
        assert_eq!(ValueKind::from_data_type("numeric(10,2)"), ValueKind::Numeric);
        assert_eq!(ValueKind::from_data_type("double precision"), ValueKind::Numeric);
        assert_eq!(ValueKind::from_data_type("boolean"), ValueKind::Boolean);
        assert_eq!(
            ValueKind::from_data_type("timestamp without time zone"),
            ValueKind::Temporal
        );
        assert_eq!(ValueKind::from_data_type("date"), ValueKind::Temporal);
        assert_eq!(ValueKind::from_data_type("text[]"), ValueKind::Array);
        assert_eq!(ValueKind::from_data_type("character varying"), ValueKind::Text);
        assert_eq!(ValueKind::from_data_type("geometry"), ValueKind::Text);
    }

    #[test]
    fn escapes_booleans_bare() {
        assert_eq!(escape_value("TRUE", Some("boolean")), "true");
        assert_eq!(escape_value("0", Some("boolean")), "false");
    }

    #[test]
    fn numbers_pass_through_only_when_valid() {
        assert_eq!(escape_value(" 42 ", Some("integer")), "42");
        assert_eq!(escape_value("-3.5", Some("numeric")), "-3.5");
        assert_eq!(escape_value("4 OR 1=1", Some("integer")), "'4 OR 1=1'");
    }

    #[test]
    fn normalizes_dates() {
        assert_eq!(escape_value("2024-03-01", Some("date")), "'2024-03-01'");
        assert_eq!(escape_value("01/03/2024", Some("date")), "'2024-03-01'");
        assert_eq!(
            escape_value("2024-03-01 10:30:00", Some("timestamp")),
            "'2024-03-01 10:30:00'"
        );
        assert_eq!(escape_value("now()", Some("timestamp")), "now()");
        assert_eq!(escape_value("CURRENT_DATE", Some("date")), "CURRENT_DATE");
    }

    #[test]
    fn malformed_dates_fall_back_to_strings() {
        assert_eq!(escape_value("next tuesday", Some("date")), "'next tuesday'");
        assert_eq!(escape_value("45/13/2024", Some("date")), "'45/13/2024'");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(escape_value("O'Brien", Some("text")), "'O''Brien'");
        assert_eq!(escape_value("O'Brien", None), "'O''Brien'");
    }

    #[test]
    fn expands_lists() {
        assert_eq!(escape_list("a, b,c", ValueKind::Text), "('a', 'b', 'c')");
        assert_eq!(escape_list("1, 2", ValueKind::Numeric), "(1, 2)");
        assert_eq!(escape_list("x,y", ValueKind::Array), "('x', 'y')");
    }

    #[test]
    fn renders_array_literals() {
        assert_eq!(escape_value("red, blue", Some("text[]")), "ARRAY['red', 'blue']");
    }
}
