pub mod config;
pub mod dialect;
pub mod editor;
pub mod error;
pub mod join_planner;
pub mod models;
pub mod query_builder;
pub mod runtime;
pub mod schema;
pub mod sql_render;
pub mod storage;
pub mod transpile;
pub mod typescript;
pub mod validation;
pub mod values;
pub mod workspace;

use std::path::Path;

use crate::error::Result;

/// Load a schema file and render the SQL for a saved editing state.
pub fn render_saved_query<P: AsRef<Path>>(
    schema_path: P,
    state: &SavedQueryState,
    use_quotes: bool,
) -> Result<String> {
    let schema = Schema::load_file(schema_path)?;
    Ok(runtime::recompute(&schema, state, use_quotes)?.sql)
}

pub use config::QueryCanvasConfig;
pub use dialect::{Dialect, PostgresDialect};
pub use editor::QueryEditor;
pub use error::QueryCanvasError;
pub use join_planner::{find_path, reconcile_joins, ReconciledJoins};
pub use models::{
    Aggregation, FilterState, GroupByType, JoinClause, JoinType, Operator, SavedQuery,
    SavedQueryState, SortDirection, UiField,
};
pub use query_builder::{build_definition, QueryDefinition};
pub use runtime::{recompute, Recomputed};
pub use schema::{ColumnSchema, ForeignKey, Schema, TableSchema};
pub use sql_render::build_select_query;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use typescript::render_interfaces;
pub use validation::{TransientError, ValidationIssue};
pub use workspace::{Workspace, WorkspaceRepository};
