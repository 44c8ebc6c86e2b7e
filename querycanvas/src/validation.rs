//! Query validation and the transient error banner.
//!
//! Validation problems never abort rendering: the renderer turns them into a
//! SQL comment, and orphaned tables raise a short-lived banner instead.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::query_builder::QueryDefinition;

/// Prefix of the placeholder SQL emitted for a hard validation error.
pub const ERROR_COMMENT_PREFIX: &str = "-- ⚠️ Error: ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("table \"{table}\" cannot be joined to the query")]
    OrphanedTable { table: String },
    #[error("HAVING requires at least one field to be grouped (set a field to \"Group By\")")]
    HavingWithoutGroupBy,
    #[error("ORDER BY {table}.{column} must be grouped, aggregated or an expression")]
    UngroupedOrderBy { table: String, column: String },
}

impl ValidationIssue {
    /// Placeholder SQL shown instead of a query.
    pub fn to_comment(&self) -> String {
        format!("{ERROR_COMMENT_PREFIX}{self}")
    }
}

/// Hard errors that prevent rendering `definition`, in a stable order:
/// HAVING first, then ORDER BY targets in sort order.
pub fn validate_definition(definition: &QueryDefinition) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if definition.group_by.is_none() {
        return issues;
    }

    if definition.has_having() && !definition.has_group_by_field {
        issues.push(ValidationIssue::HavingWithoutGroupBy);
    }

    for order in definition.order_by.iter().flatten() {
        let grouped = definition.groups_column(&order.table, &order.column);
        let aggregated_or_expr = definition
            .selected(&order.table, &order.column)
            .is_some_and(|s| s.aggregation.is_some() || s.is_expression());
        if !grouped && !aggregated_or_expr {
            issues.push(ValidationIssue::UngroupedOrderBy {
                table: order.table.clone(),
                column: order.column.clone(),
            });
        }
    }
    issues
}

/// Orphaned tables expressed as validation issues.
pub fn orphan_issues(orphans: &[String]) -> Vec<ValidationIssue> {
    orphans
        .iter()
        .map(|table| ValidationIssue::OrphanedTable {
            table: table.clone(),
        })
        .collect()
}

/// Self-clearing error message. Ephemeral session state, never persisted.
#[derive(Debug, Clone)]
pub struct TransientError {
    message: String,
    raised_at: Instant,
    ttl: Duration,
}

impl TransientError {
    pub fn new(message: impl Into<String>, ttl: Duration) -> Self {
        Self::raised_at(message, Instant::now(), ttl)
    }

    pub fn raised_at(message: impl Into<String>, raised_at: Instant, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            raised_at,
            ttl,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_active(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < self.ttl
    }
}
