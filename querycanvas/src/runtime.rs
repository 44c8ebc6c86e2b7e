//! The full re-derivation pass run after every edit:
//! join reconciliation, validation, definition assembly, SQL rendering.

use std::collections::HashSet;

use crate::error::{QueryCanvasError, Result};
use crate::join_planner::reconcile_joins;
use crate::models::{JoinClause, SavedQueryState, UiField};
use crate::query_builder::{build_definition, QueryDefinition};
use crate::schema::Schema;
use crate::sql_render::{append_warnings, build_select_query};

/// Everything derived from one editing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputed {
    pub from: String,
    pub joins: Vec<JoinClause>,
    /// Field tables with no join path; their fields are left out of the SQL.
    pub orphans: Vec<String>,
    pub warnings: Vec<String>,
    pub definition: QueryDefinition,
    pub sql: String,
}

/// Re-derive joins, definition and SQL for `state`.
///
/// Deterministic and side-effect free. Only an unusable FROM table is an
/// error; every other problem degrades to warnings or an explanatory comment.
pub fn recompute(schema: &Schema, state: &SavedQueryState, use_quotes: bool) -> Result<Recomputed> {
    let reconciled = reconcile_joins(&state.fields, schema, &state.joins, &state.from);
    let from = reconciled
        .from
        .ok_or_else(|| QueryCanvasError::Sql("schema has no tables to select from".into()))?;

    let orphaned: HashSet<&str> = reconciled.orphans.iter().map(String::as_str).collect();
    let reachable: Vec<UiField> = state
        .fields
        .iter()
        .filter(|f| !orphaned.contains(f.table.as_str()))
        .cloned()
        .collect();

    let definition = build_definition(
        &reachable,
        &reconciled.joins,
        &from,
        state.is_group_by_active,
        state.filter_group_count,
    );
    let sql = build_select_query(&definition, schema, use_quotes)?;
    let sql = append_warnings(&sql, &reconciled.warnings);

    tracing::debug!(
        from = %from,
        joins = reconciled.joins.len(),
        orphans = reconciled.orphans.len(),
        "recomputed query"
    );

    Ok(Recomputed {
        from,
        joins: reconciled.joins,
        orphans: reconciled.orphans,
        warnings: reconciled.warnings,
        definition,
        sql,
    })
}
