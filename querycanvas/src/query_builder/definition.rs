//! Schema-independent description of a SELECT, assembled from canvas fields
//! just before rendering.

use serde::{Deserialize, Serialize};

use crate::models::{Aggregation, JoinClause, Operator, SortDirection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectField {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    /// Raw expression replacing `table.column`; blank means fall back to the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl SelectField {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            alias: None,
            aggregation: None,
            expression: None,
        }
    }

    pub fn is_expression(&self) -> bool {
        self.expression.is_some()
    }

    pub fn refers_to(&self, table: &str, column: &str) -> bool {
        self.table == table && self.column == column
    }
}

/// One predicate. `aggregation`/`expression` are only used by HAVING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereClause {
    pub table: String,
    pub column: String,
    pub op: Operator,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl WhereClause {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        op: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            op,
            value: value.into(),
            aggregation: None,
            expression: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GroupByItem {
    Column { table: String, column: String },
    Expression { sql: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderByClause {
    pub table: String,
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    pub from: String,
    #[serde(default)]
    pub joins: Vec<JoinClause>,
    #[serde(default)]
    pub select: Vec<SelectField>,
    /// `Some` whenever grouping is active, even if nothing is grouped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<Vec<GroupByItem>>,
    /// Some field is explicitly set to "Group By". Scalar expressions also
    /// land in `group_by` but do not count.
    #[serde(default)]
    pub has_group_by_field: bool,
    /// OR-ed groups of AND-ed predicates.
    #[serde(default)]
    pub where_groups: Vec<Vec<WhereClause>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having_groups: Option<Vec<Vec<WhereClause>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<OrderByClause>>,
}

impl QueryDefinition {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    pub fn has_having(&self) -> bool {
        self.having_groups
            .as_ref()
            .is_some_and(|groups| groups.iter().any(|g| !g.is_empty()))
    }

    pub fn groups_column(&self, table: &str, column: &str) -> bool {
        self.group_by.iter().flatten().any(|item| {
            matches!(item, GroupByItem::Column { table: t, column: c } if t == table && c == column)
        })
    }

    /// The projected field for `table.column`, if any.
    pub fn selected(&self, table: &str, column: &str) -> Option<&SelectField> {
        self.select.iter().find(|s| s.refers_to(table, column))
    }
}
