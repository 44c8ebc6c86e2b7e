use std::collections::HashSet;

use crate::models::{JoinClause, UiField};
use crate::schema::Schema;

use super::ordering::order_joins;
use super::path::find_path;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledJoins {
    /// Root FROM table, `None` only when the schema is empty and no field is placed.
    pub from: Option<String>,
    pub joins: Vec<JoinClause>,
    /// Field tables with no join path to the root.
    pub orphans: Vec<String>,
    pub warnings: Vec<String>,
}

/// Tables reachable from the root, kept in discovery order so path-finding
/// seeds are deterministic.
#[derive(Debug, Default)]
struct Connected {
    order: Vec<String>,
    set: HashSet<String>,
}

impl Connected {
    fn insert(&mut self, table: &str) -> bool {
        if self.set.insert(table.to_string()) {
            self.order.push(table.to_string());
            true
        } else {
            false
        }
    }

    fn contains(&self, table: &str) -> bool {
        self.set.contains(table)
    }
}

/// Root table: first field's table, else a still-valid previous root, else
/// the first table of the schema.
pub fn resolve_root(fields: &[UiField], schema: &Schema, previous_from: &str) -> Option<String> {
    if let Some(first) = fields.first() {
        return Some(first.table.clone());
    }
    if schema.contains_table(previous_from) {
        return Some(previous_from.to_string());
    }
    schema.first_table().map(|t| t.table_name.clone())
}

/// Re-derive the ordered join list for `fields`.
///
/// Manual joins from `previous_joins` are kept (possibly reoriented); auto
/// joins are regenerated, reusing the id and LEFT/RIGHT intent of a previous
/// auto join over the same table pair.
pub fn reconcile_joins(
    fields: &[UiField],
    schema: &Schema,
    previous_joins: &[JoinClause],
    previous_from: &str,
) -> ReconciledJoins {
    let Some(root) = resolve_root(fields, schema, previous_from) else {
        return ReconciledJoins::default();
    };

    let manual: Vec<JoinClause> = previous_joins
        .iter()
        .filter(|j| !j.is_auto)
        .cloned()
        .collect();
    let previous_auto: Vec<&JoinClause> = previous_joins.iter().filter(|j| j.is_auto).collect();

    let mut connected = Connected::default();
    connected.insert(&root);
    expand_through_manual(&mut connected, &manual);

    let mut planned: Vec<JoinClause> = Vec::new();
    let mut orphans: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut visited_tables: HashSet<&str> = HashSet::new();

    for field in fields {
        let table = field.table.as_str();
        if !visited_tables.insert(table) || connected.contains(table) {
            continue;
        }
        match find_path(connected.order.as_slice(), table, schema) {
            Some(path) => {
                for join in path {
                    let covered = planned.iter().chain(manual.iter()).any(|p| p.same_pair(&join));
                    connected.insert(&join.table1);
                    connected.insert(&join.table2);
                    if !covered {
                        planned.push(preserve_identity(join, &previous_auto));
                    }
                }
            }
            None => {
                tracing::warn!(table = %table, root = %root, "no join path for table");
                warnings.push(format!(
                    "No join path found from \"{root}\" to \"{table}\""
                ));
                orphans.push(table.to_string());
            }
        }
    }

    let mut pool = manual;
    pool.extend(planned);
    let ordered = order_joins(&root, pool);
    for id in &ordered.unplaced {
        warnings.push(format!("Join \"{id}\" is not connected to \"{root}\""));
    }

    tracing::debug!(
        root = %root,
        joins = ordered.joins.len(),
        orphans = orphans.len(),
        "joins reconciled"
    );

    ReconciledJoins {
        from: Some(root),
        joins: ordered.joins,
        orphans,
        warnings,
    }
}

/// Grow `connected` through manual joins, treated as undirected edges.
fn expand_through_manual(connected: &mut Connected, manual: &[JoinClause]) {
    loop {
        let mut grew = false;
        for join in manual {
            let left = connected.contains(&join.table1);
            let right = connected.contains(&join.table2);
            if left && !right {
                grew |= connected.insert(&join.table2);
            } else if right && !left {
                grew |= connected.insert(&join.table1);
            }
        }
        if !grew {
            break;
        }
    }
}

/// Carry over id and join type from a previous auto join over the same pair.
/// A flipped orientation flips LEFT/RIGHT so the outer side stays the same table.
fn preserve_identity(mut join: JoinClause, previous_auto: &[&JoinClause]) -> JoinClause {
    if let Some(prev) = previous_auto.iter().find(|p| p.same_pair(&join)) {
        join.id = prev.id.clone();
        join.join_type = if prev.table1 == join.table1 {
            prev.join_type
        } else {
            prev.join_type.flipped()
        };
    }
    join
}
