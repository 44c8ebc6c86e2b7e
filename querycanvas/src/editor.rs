//! Stateful query-editing session.
//!
//! Every mutation ends in a full [`recompute`]; there is no incremental
//! update. The session owns the only ephemeral state: the transient error
//! banner and the last SQL shown.

use std::time::{Duration, Instant};

use crate::config::QueryCanvasConfig;
use crate::error::{QueryCanvasError, Result};
use crate::join_planner::join_signature;
use crate::models::{GroupByType, JoinClause, JoinType, SavedQueryState, UiField};
use crate::query_builder::clamp_group_count;
use crate::runtime::recompute;
use crate::schema::Schema;
use crate::validation::{orphan_issues, TransientError, ERROR_COMMENT_PREFIX};

/// Incrementing id source, unique within a session.
#[derive(Debug, Default, Clone)]
struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Start above every numeric suffix already in use.
    fn seeded<'a>(ids: impl Iterator<Item = &'a str>) -> Self {
        let max = ids
            .filter_map(|id| id.rsplit('-').next()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            next: max.saturating_add(1),
        }
    }

    fn next(&mut self, prefix: &str) -> String {
        let current = self.next.max(1);
        self.next = current.saturating_add(1);
        format!("{prefix}-{current}")
    }
}

pub struct QueryEditor {
    schema: Schema,
    state: SavedQueryState,
    use_quotes: bool,
    banner_ttl: Duration,
    ids: IdGenerator,
    sql: String,
    warnings: Vec<String>,
    orphans: Vec<String>,
    temp_error: Option<TransientError>,
}

impl QueryEditor {
    pub fn new(schema: Schema, config: &QueryCanvasConfig) -> Self {
        let state = SavedQueryState {
            is_group_by_active: config.editor.group_by_active,
            filter_group_count: clamp_group_count(config.editor.filter_group_count),
            ..SavedQueryState::default()
        };
        Self::from_saved(schema, state, config)
    }

    /// Resume editing a saved snapshot.
    pub fn from_saved(schema: Schema, state: SavedQueryState, config: &QueryCanvasConfig) -> Self {
        let ids = IdGenerator::seeded(
            state
                .fields
                .iter()
                .map(|f| f.id.as_str())
                .chain(state.joins.iter().filter(|j| !j.is_auto).map(|j| j.id.as_str())),
        );
        let mut editor = Self {
            schema,
            state,
            use_quotes: config.editor.use_quotes,
            banner_ttl: config.validation.error_banner_ttl(),
            ids,
            sql: String::new(),
            warnings: Vec::new(),
            orphans: Vec::new(),
            temp_error: None,
        };
        editor.refresh();
        editor
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &SavedQueryState {
        &self.state
    }

    /// Serializable snapshot of the current query.
    pub fn snapshot(&self) -> SavedQueryState {
        self.state.clone()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn from_table(&self) -> &str {
        &self.state.from
    }

    pub fn fields(&self) -> &[UiField] {
        &self.state.fields
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.state.joins
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn orphans(&self) -> &[String] {
        &self.orphans
    }

    pub fn use_quotes(&self) -> bool {
        self.use_quotes
    }

    /// Banner text, while it has not expired.
    pub fn active_error(&self, now: Instant) -> Option<&str> {
        self.temp_error
            .as_ref()
            .filter(|e| e.is_active(now))
            .map(|e| e.message())
    }

    pub fn add_field(&mut self, table: &str, column: &str) -> Result<String> {
        let known = self.schema.table(table).ok_or_else(|| {
            QueryCanvasError::Validation(format!("unknown table {table}"))
        })?;
        if column != "*" && known.column(column).is_none() {
            return Err(QueryCanvasError::Validation(format!(
                "unknown column {table}.{column}"
            )));
        }
        let id = self.ids.next("field");
        self.state.fields.push(UiField::new(&id, table, column));
        self.refresh();
        Ok(id)
    }

    /// Add a free-form expression evaluated in the context of `table`.
    pub fn add_expression_field(&mut self, table: &str, expression: &str) -> Result<String> {
        let id = self.add_field(table, "*")?;
        self.update_field(&id, |field| {
            field.group_by_type = GroupByType::Expression;
            field.expression = Some(expression.to_string());
        })?;
        Ok(id)
    }

    /// Removing the first field changes the FROM table.
    pub fn remove_field(&mut self, id: &str) -> Result<()> {
        let idx = self.field_index(id)?;
        self.state.fields.remove(idx);
        self.refresh();
        Ok(())
    }

    /// Reorder fields. Moving a field to position 0 makes its table the root.
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.state.fields.len();
        if from >= len || to >= len {
            return Err(QueryCanvasError::Validation(format!(
                "field position out of range ({from} -> {to}, {len} fields)"
            )));
        }
        let field = self.state.fields.remove(from);
        self.state.fields.insert(to, field);
        self.refresh();
        Ok(())
    }

    pub fn update_field(&mut self, id: &str, edit: impl FnOnce(&mut UiField)) -> Result<()> {
        let idx = self.field_index(id)?;
        edit(&mut self.state.fields[idx]);
        self.refresh();
        Ok(())
    }

    pub fn add_manual_join(
        &mut self,
        join_type: JoinType,
        table1: &str,
        column1: &str,
        table2: &str,
        column2: &str,
    ) -> Result<String> {
        for (table, column) in [(table1, column1), (table2, column2)] {
            if self.schema.column(table, column).is_none() {
                return Err(QueryCanvasError::Validation(format!(
                    "unknown join column {table}.{column}"
                )));
            }
        }
        let id = self.ids.next("join");
        self.state.joins.push(JoinClause {
            id: id.clone(),
            join_type,
            table1: table1.to_string(),
            column1: column1.to_string(),
            table2: table2.to_string(),
            column2: column2.to_string(),
            is_auto: false,
        });
        self.refresh();
        Ok(id)
    }

    /// Change a join's type. Auto joins keep the new type across recomputes.
    pub fn set_join_type(&mut self, id: &str, join_type: JoinType) -> Result<()> {
        let join = self
            .state
            .joins
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| QueryCanvasError::Validation(format!("unknown join {id}")))?;
        join.join_type = join_type;
        self.refresh();
        Ok(())
    }

    /// Remove a join. An auto join is regenerated on the next recompute if
    /// its tables are still needed.
    pub fn remove_join(&mut self, id: &str) -> Result<()> {
        let idx = self
            .state
            .joins
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| QueryCanvasError::Validation(format!("unknown join {id}")))?;
        self.state.joins.remove(idx);
        self.refresh();
        Ok(())
    }

    pub fn set_group_by_active(&mut self, active: bool) {
        self.state.is_group_by_active = active;
        self.refresh();
    }

    pub fn set_filter_group_count(&mut self, count: usize) {
        self.state.filter_group_count = clamp_group_count(count);
        self.refresh();
    }

    pub fn set_use_quotes(&mut self, use_quotes: bool) {
        self.use_quotes = use_quotes;
        self.refresh();
    }

    /// Load a new schema. The query state is reset rather than merged.
    pub fn replace_schema(&mut self, schema: Schema) {
        self.schema = schema;
        self.state = SavedQueryState {
            is_group_by_active: self.state.is_group_by_active,
            filter_group_count: self.state.filter_group_count,
            ..SavedQueryState::default()
        };
        self.temp_error = None;
        self.refresh();
    }

    fn field_index(&self, id: &str) -> Result<usize> {
        self.state
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| QueryCanvasError::Validation(format!("unknown field {id}")))
    }

    fn refresh(&mut self) {
        let result = match recompute(&self.schema, &self.state, self.use_quotes) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "query could not be rendered");
                self.sql = format!("{ERROR_COMMENT_PREFIX}{e}");
                return;
            }
        };

        if join_signature(&result.joins) == join_signature(&self.state.joins) {
            tracing::trace!("join list unchanged");
        } else {
            self.state.joins = result.joins;
        }
        self.state.from = result.from;
        self.warnings = result.warnings;
        self.orphans = result.orphans;

        if self.orphans.is_empty() || self.sql.is_empty() {
            self.sql = result.sql;
        }
        if !self.orphans.is_empty() {
            let message = orphan_issues(&self.orphans)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(orphans = ?self.orphans, "orphaned tables in query");
            self.temp_error = Some(TransientError::new(message, self.banner_ttl));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_continue_above_restored_ones() {
        let mut ids = IdGenerator::seeded(["field-3", "join-9", "custom"].into_iter());
        assert_eq!(ids.next("field"), "field-10");
        assert_eq!(ids.next("join"), "join-11");
    }

    #[test]
    fn huge_restored_id_saturates() {
        let mut ids = IdGenerator::seeded(["field-18446744073709551615"].into_iter());
        assert_eq!(ids.next("field"), "field-18446744073709551615");
        assert_eq!(ids.next("field"), "field-18446744073709551615");
    }
}
