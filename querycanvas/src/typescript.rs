//! TypeScript interface export for a schema.

use crate::schema::{ColumnSchema, Schema, TableSchema};

/// Render one `export interface` per table.
pub fn render_interfaces(schema: &Schema) -> String {
    schema
        .tables()
        .iter()
        .map(render_interface)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_interface(table: &TableSchema) -> String {
    let mut out = format!("export interface {} {{\n", pascal_case(&table.table_name));
    for column in &table.columns {
        out.push_str(&render_property(column));
    }
    out.push('}');
    out
}

fn render_property(column: &ColumnSchema) -> String {
    let name = camel_case(&column.column_name);
    let ty = ts_type(&column.data_type);
    if column.is_nullable {
        format!("  {name}?: {ty} | null;\n")
    } else {
        format!("  {name}: {ty};\n")
    }
}

/// Map a SQL data type to a TypeScript type.
pub fn ts_type(data_type: &str) -> &'static str {
    let ty = data_type.trim().to_ascii_lowercase();
    match ty.as_str() {
        "integer" | "int" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "serial"
        | "bigserial" | "real" | "float" | "float4" | "float8" | "double precision" => "number",
        _ if ty.starts_with("numeric") || ty.starts_with("decimal") => "number",
        "boolean" | "bool" => "boolean",
        "json" | "jsonb" => "any",
        _ if ty.ends_with("[]") || ty == "array" => "any",
        _ => "string",
    }
}

pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

pub fn camel_case(name: &str) -> String {
    let pascal = pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_names() {
        assert_eq!(pascal_case("user_roles"), "UserRoles");
        assert_eq!(camel_case("created_at"), "createdAt");
        assert_eq!(camel_case("id"), "id");
    }

    #[test]
    fn maps_types() {
        assert_eq!(ts_type("integer"), "number");
        assert_eq!(ts_type("numeric(12,2)"), "number");
        assert_eq!(ts_type("boolean"), "boolean");
        assert_eq!(ts_type("jsonb"), "any");
        assert_eq!(ts_type("timestamp with time zone"), "string");
    }

    #[test]
    fn renders_interface() {
        let table = TableSchema {
            table_name: "user_roles".to_string(),
            columns: vec![
                ColumnSchema {
                    column_name: "user_id".to_string(),
                    data_type: "integer".to_string(),
                    is_nullable: false,
                    default: None,
                },
                ColumnSchema {
                    column_name: "granted_at".to_string(),
                    data_type: "timestamp".to_string(),
                    is_nullable: true,
                    default: None,
                },
            ],
            primary_key: vec!["user_id".to_string()],
            foreign_keys: Vec::new(),
        };
        assert_eq!(
            render_interface(&table),
            "export interface UserRoles {\n  userId: number;\n  grantedAt?: string | null;\n}"
        );
    }
}
