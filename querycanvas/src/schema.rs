//! Static schema description: tables, columns, primary and foreign keys.
//!
//! The schema is loaded once per workspace and never mutated while a query is
//! being edited.

use std::path::Path;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{QueryCanvasError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column_name: String,
    pub data_type: String,
    #[serde(default, deserialize_with = "deserialize_nullable_flag")]
    pub is_nullable: bool,
    #[serde(default, deserialize_with = "deserialize_default_text")]
    pub default: Option<String>,
}

/// Directed edge: the owning table's `column` references `ref_table.ref_column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

/// Ordered collection of tables. Order matters: it drives path-finding
/// tie-breaks and the fallback root table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: Vec<TableSchema>,
}

/// Accepted shapes of an imported schema document.
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Bare(Vec<TableSchema>),
    Wrapped { schema: Vec<TableSchema> },
    /// Only the first entry must carry `schema`; later entries are export
    /// metadata and are ignored.
    WrappedList(Vec<Value>),
}

#[derive(Deserialize)]
struct WrappedSchema {
    schema: Vec<TableSchema>,
}

impl SchemaDocument {
    fn into_tables(self) -> Result<Vec<TableSchema>> {
        match self {
            SchemaDocument::Bare(tables) => Ok(tables),
            SchemaDocument::Wrapped { schema } => Ok(schema),
            SchemaDocument::WrappedList(list) => {
                let first = list
                    .into_iter()
                    .next()
                    .ok_or_else(|| QueryCanvasError::Schema("schema document is empty".into()))?;
                let wrapped: WrappedSchema = serde_json::from_value(first).map_err(|e| {
                    QueryCanvasError::Schema(format!("unrecognized schema document: {e}"))
                })?;
                Ok(wrapped.schema)
            }
        }
    }
}

impl Schema {
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    /// Parse a JSON schema document: a bare table array, `{ "schema": [...] }`,
    /// or an array whose first element carries `schema`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(json).map_err(|e| {
            QueryCanvasError::Schema(format!("unrecognized schema document: {e}"))
        })?;
        Ok(Self::new(doc.into_tables()?))
    }

    /// Same shapes as [`Schema::from_json_str`], written as YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_yaml::from_str(yaml).map_err(|e| {
            QueryCanvasError::Schema(format!("unrecognized schema document: {e}"))
        })?;
        Ok(Self::new(doc.into_tables()?))
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => Self::from_yaml_str(&contents),
            Some("json") | None => Self::from_json_str(&contents),
            Some(other) => Err(QueryCanvasError::Schema(format!(
                "unsupported schema file extension .{other} ({})",
                path.display()
            ))),
        }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.table_name == name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn first_table(&self) -> Option<&TableSchema> {
        self.tables.first()
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnSchema> {
        self.table(table).and_then(|t| t.column(column))
    }

    /// Declared data type of `table.column`, if both exist.
    pub fn data_type(&self, table: &str, column: &str) -> Option<&str> {
        self.column(table, column).map(|c| c.data_type.as_str())
    }
}

fn deserialize_null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<ForeignKey>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ForeignKey>>::deserialize(deserializer)?.unwrap_or_default())
}

// information_schema exports spell nullability as "YES"/"NO".
fn deserialize_nullable_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::String(s) => match s.to_ascii_uppercase().as_str() {
            "YES" | "TRUE" | "Y" => Ok(true),
            "NO" | "FALSE" | "N" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "invalid is_nullable value '{other}'"
            ))),
        },
        other => Err(de::Error::custom(format!(
            "invalid is_nullable value {other}"
        ))),
    }
}

fn deserialize_default_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Ok(Some(other.to_string())),
    }
}
