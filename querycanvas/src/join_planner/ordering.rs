use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::models::JoinClause;

/// Result of ordering a join pool against a root table.
#[derive(Debug, Clone, Default)]
pub struct OrderedJoins {
    pub joins: Vec<JoinClause>,
    /// Ids of joins that could not be attached to the root and were appended as-is.
    pub unplaced: Vec<String>,
}

/// Order `pool` so each clause's `table1` is defined by the root or an
/// earlier clause, reversing clauses that arrive back to front.
///
/// Passes over the remaining pool repeat until one makes no progress;
/// leftovers are appended unchanged so they are never silently lost.
pub fn order_joins(root: &str, pool: Vec<JoinClause>) -> OrderedJoins {
    let mut defined: HashSet<String> = HashSet::new();
    defined.insert(root.to_string());

    let mut ordered = Vec::with_capacity(pool.len());
    let mut remaining = pool;

    loop {
        let mut progressed = false;
        let mut deferred = Vec::new();
        for join in remaining {
            let left = defined.contains(&join.table1);
            let right = defined.contains(&join.table2);
            match (left, right) {
                (true, false) => {
                    defined.insert(join.table2.clone());
                    ordered.push(join);
                    progressed = true;
                }
                (false, true) => {
                    tracing::debug!(
                        join = %join.id,
                        table = %join.table1,
                        "reorienting join"
                    );
                    let reversed = join.reversed();
                    defined.insert(reversed.table2.clone());
                    ordered.push(reversed);
                    progressed = true;
                }
                // cycle-closing constraint between two defined tables
                (true, true) => {
                    ordered.push(join);
                    progressed = true;
                }
                (false, false) => deferred.push(join),
            }
        }
        remaining = deferred;
        if !progressed || remaining.is_empty() {
            break;
        }
    }

    let unplaced: Vec<String> = remaining.iter().map(|j| j.id.clone()).collect();
    if !unplaced.is_empty() {
        tracing::warn!(count = unplaced.len(), root = %root, "joins not connected to root");
    }
    ordered.extend(remaining);
    OrderedJoins {
        joins: ordered,
        unplaced,
    }
}

/// Stable fingerprint over `table1-type-table2` triples, used to detect
/// that a recomputed join list is equivalent to the current one.
pub fn join_signature(joins: &[JoinClause]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for join in joins {
        format!("{}-{}-{}", join.table1, join.join_type, join.table2).hash(&mut hasher);
    }
    hasher.finish()
}
