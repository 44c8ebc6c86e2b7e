//! Shortest join path over the foreign-key graph.
//!
//! Edges are walked in both directions for reachability; the direction only
//! decides which column sits on which side of the generated clause.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::JoinClause;
use crate::schema::Schema;

/// Find the shortest chain of joins connecting `target` to any of `sources`.
///
/// BFS is seeded with every source at once, so the result hangs off whichever
/// source is closest. Returns `Some(vec![])` when `target` is already a source
/// and `None` when no path exists.
pub fn find_path<S: AsRef<str>>(
    sources: &[S],
    target: &str,
    schema: &Schema,
) -> Option<Vec<JoinClause>> {
    if sources.iter().any(|s| s.as_ref() == target) {
        return Some(Vec::new());
    }
    if !schema.contains_table(target) {
        tracing::debug!(target = %target, "join target not in schema");
        return None;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    // table -> clause that first reached it
    let mut reached_by: HashMap<&str, JoinClause> = HashMap::new();

    for source in sources {
        let source = source.as_ref();
        if seen.insert(source) {
            queue.push_back(source);
        }
    }

    while let Some(current) = queue.pop_front() {
        if let Some(last) = direct_edge(current, target, schema) {
            let mut path = path_to(current, &reached_by);
            path.push(last);
            tracing::debug!(
                target = %target,
                hops = path.len(),
                "join path found"
            );
            return Some(path);
        }

        for (neighbour, clause) in neighbours(current, schema) {
            if seen.insert(neighbour) {
                tracing::trace!(from = %current, to = %neighbour, "expanding join frontier");
                reached_by.insert(neighbour, clause);
                queue.push_back(neighbour);
            }
        }
    }

    tracing::debug!(target = %target, "no join path");
    None
}

/// Single clause joining `target` onto `current`, forward FKs first.
fn direct_edge(current: &str, target: &str, schema: &Schema) -> Option<JoinClause> {
    if let Some(table) = schema.table(current) {
        if let Some(fk) = table.foreign_keys.iter().find(|fk| fk.ref_table == target) {
            return Some(JoinClause::auto(current, &fk.column, target, &fk.ref_column));
        }
    }
    let target_table = schema.table(target)?;
    target_table
        .foreign_keys
        .iter()
        .find(|fk| fk.ref_table == current)
        .map(|fk| JoinClause::auto(current, &fk.ref_column, target, &fk.column))
}

/// Tables adjacent to `current` with the clause reaching each, in
/// tie-break order: forward FKs by array order, then referencing tables by
/// schema order.
fn neighbours<'s>(current: &str, schema: &'s Schema) -> Vec<(&'s str, JoinClause)> {
    let mut out = Vec::new();
    if let Some(table) = schema.table(current) {
        for fk in &table.foreign_keys {
            if let Some(referenced) = schema.table(&fk.ref_table) {
                out.push((
                    referenced.table_name.as_str(),
                    JoinClause::auto(current, &fk.column, &fk.ref_table, &fk.ref_column),
                ));
            }
        }
    }
    for other in schema.tables() {
        for fk in &other.foreign_keys {
            if fk.ref_table == current {
                out.push((
                    other.table_name.as_str(),
                    JoinClause::auto(current, &fk.ref_column, &other.table_name, &fk.column),
                ));
            }
        }
    }
    out
}

fn path_to(table: &str, reached_by: &HashMap<&str, JoinClause>) -> Vec<JoinClause> {
    let mut path = Vec::new();
    let mut node = table;
    while let Some(clause) = reached_by.get(node) {
        path.push(clause.clone());
        node = clause.table1.as_str();
    }
    path.reverse();
    path
}
