//! SQL text generation from a [`QueryDefinition`].

use crate::dialect::{Dialect, PostgresDialect};
use crate::error::{QueryCanvasError, Result};
use crate::models::{Aggregation, JoinClause, Operator};
use crate::query_builder::{GroupByItem, OrderByClause, QueryDefinition, SelectField, WhereClause};
use crate::schema::Schema;
use crate::transpile::transpile_iif;
use crate::validation::validate_definition;
use crate::values::{escape_list, escape_scalar, quote_string, ValueKind};

/// Render `definition` as Postgres-like SQL.
///
/// Fails only when the FROM table is missing or unknown. Validation problems
/// come back as an `-- ⚠️ Error:` comment instead of SQL.
pub fn build_select_query(
    definition: &QueryDefinition,
    schema: &Schema,
    use_quotes: bool,
) -> Result<String> {
    let dialect = PostgresDialect::new(use_quotes);
    SqlRenderer::new(&dialect, schema).render_select(definition)
}

/// Append join-path warnings as a trailing comment block.
pub fn append_warnings(sql: &str, warnings: &[String]) -> String {
    if warnings.is_empty() {
        return sql.to_string();
    }
    let mut out = format!("{sql}\n\n-- ⚠️ Warnings:");
    for warning in warnings {
        out.push_str("\n-- ");
        out.push_str(&warning.replace('\n', " "));
    }
    out
}

pub struct SqlRenderer<'a> {
    dialect: &'a dyn Dialect,
    schema: &'a Schema,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(dialect: &'a dyn Dialect, schema: &'a Schema) -> Self {
        Self { dialect, schema }
    }

    pub fn render_select(&self, definition: &QueryDefinition) -> Result<String> {
        let from = definition.from.trim();
        if from.is_empty() {
            return Err(QueryCanvasError::Sql("query has no FROM table".into()));
        }
        if !self.schema.contains_table(from) {
            return Err(QueryCanvasError::Sql(format!(
                "FROM table \"{from}\" not found in schema"
            )));
        }

        if let Some(issue) = validate_definition(definition).into_iter().next() {
            tracing::debug!(issue = %issue, "query failed validation");
            return Ok(issue.to_comment());
        }

        tracing::debug!(
            from = %from,
            joins = definition.joins.len(),
            columns = definition.select.len(),
            "rendering select"
        );

        let mut lines = Vec::new();

        let select_items: Vec<String> = definition
            .select
            .iter()
            .map(|field| {
                let expr = self.select_expr(field);
                match &field.alias {
                    Some(alias) => format!("{expr} AS {}", self.dialect.quote_ident(alias)),
                    None => expr,
                }
            })
            .collect();
        if select_items.is_empty() {
            lines.push("SELECT *".to_string());
        } else {
            lines.push(format!("SELECT {}", select_items.join(", ")));
        }

        lines.push(format!("FROM {}", self.dialect.quote_ident(from)));

        for join in &definition.joins {
            lines.push(self.render_join(join));
        }

        if !definition.where_groups.is_empty() {
            lines.push(format!(
                "WHERE {}",
                self.render_groups(&definition.where_groups, true)
            ));
        }

        if let Some(group_by) = definition.group_by.as_ref().filter(|g| !g.is_empty()) {
            let items: Vec<String> = group_by.iter().map(|g| self.render_group_item(g)).collect();
            lines.push(format!("GROUP BY {}", items.join(", ")));
        }

        if let Some(having) = definition
            .having_groups
            .as_ref()
            .filter(|groups| groups.iter().any(|g| !g.is_empty()))
        {
            let parenthesize = having.len() > 1;
            lines.push(format!("HAVING {}", self.render_groups(having, parenthesize)));
        }

        if let Some(order_by) = definition.order_by.as_ref().filter(|o| !o.is_empty()) {
            let items: Vec<String> = order_by
                .iter()
                .map(|o| self.render_order_item(o, definition))
                .collect();
            lines.push(format!("ORDER BY {}", items.join(", ")));
        }

        Ok(format!("{};", lines.join("\n")))
    }

    fn column_ref(&self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.dialect.quote_ident(table),
            self.dialect.quote_ident(column)
        )
    }

    fn is_boolean_column(&self, table: &str, column: &str) -> bool {
        self.schema
            .data_type(table, column)
            .is_some_and(|ty| ValueKind::from_data_type(ty) == ValueKind::Boolean)
    }

    fn aggregate(&self, agg: Aggregation, table: &str, column: &str) -> String {
        if column == "*" && agg == Aggregation::Count {
            return "COUNT(*)".to_string();
        }
        self.dialect.render_aggregation(
            agg,
            &self.column_ref(table, column),
            self.is_boolean_column(table, column),
        )
    }

    /// Projection expression without alias.
    fn select_expr(&self, field: &SelectField) -> String {
        if let Some(expr) = non_blank(field.expression.as_deref()) {
            return transpile_iif(expr);
        }
        match field.aggregation {
            Some(agg) => self.aggregate(agg, &field.table, &field.column),
            None => self.column_ref(&field.table, &field.column),
        }
    }

    fn render_join(&self, join: &JoinClause) -> String {
        format!(
            "{} {} ON {} = {}",
            join.join_type.as_sql(),
            self.dialect.quote_ident(&join.table2),
            self.column_ref(&join.table1, &join.column1),
            self.column_ref(&join.table2, &join.column2)
        )
    }

    fn render_group_item(&self, item: &GroupByItem) -> String {
        match item {
            GroupByItem::Column { table, column } => self.column_ref(table, column),
            GroupByItem::Expression { sql } => transpile_iif(sql),
        }
    }

    fn render_order_item(&self, order: &OrderByClause, definition: &QueryDefinition) -> String {
        let expr = match definition.selected(&order.table, &order.column) {
            Some(field) if field.aggregation.is_some() || field.is_expression() => {
                self.select_expr(field)
            }
            _ => self.column_ref(&order.table, &order.column),
        };
        format!("{expr} {}", order.direction.as_sql())
    }

    /// OR-joined groups of AND-joined predicates.
    fn render_groups(&self, groups: &[Vec<WhereClause>], parenthesize: bool) -> String {
        let rendered: Vec<String> = groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(|group| {
                let preds: Vec<String> = group.iter().map(|p| self.render_predicate(p)).collect();
                let joined = preds.join(" AND ");
                if parenthesize {
                    format!("({joined})")
                } else {
                    joined
                }
            })
            .collect();
        rendered.join(" OR ")
    }

    fn render_predicate(&self, clause: &WhereClause) -> String {
        let (target, kind) = if let Some(expr) = non_blank(clause.expression.as_deref()) {
            (transpile_iif(expr), ValueKind::Numeric)
        } else if let Some(agg) = clause.aggregation {
            let kind = if agg.yields_number() {
                ValueKind::Numeric
            } else {
                self.value_kind(&clause.table, &clause.column)
            };
            (self.aggregate(agg, &clause.table, &clause.column), kind)
        } else {
            (
                self.column_ref(&clause.table, &clause.column),
                self.value_kind(&clause.table, &clause.column),
            )
        };

        let op = clause.op;
        match op {
            Operator::IsNull | Operator::IsNotNull => format!("{target} {op}"),
            Operator::Sql => format!("{target} {}", transpile_iif(clause.value.trim())),
            _ if op.is_pattern() => {
                format!("{target} {op} {}", quote_string(&format!("%{}%", clause.value.trim())))
            }
            _ if op.is_list() => format!("{target} {op} {}", escape_list(&clause.value, kind)),
            _ => format!("{target} {op} {}", escape_scalar(&clause.value, kind)),
        }
    }

    fn value_kind(&self, table: &str, column: &str) -> ValueKind {
        self.schema
            .data_type(table, column)
            .map_or(ValueKind::Text, ValueKind::from_data_type)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
