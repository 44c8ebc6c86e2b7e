//! Assembly of a [`QueryDefinition`] from canvas fields.

use crate::models::{GroupByType, JoinClause, UiField};
use crate::transpile::is_aggregate_expression;

use super::definition::{GroupByItem, OrderByClause, QueryDefinition, SelectField};
use super::filters::{collect_having_group, collect_where_groups};

/// Pure transform from canvas state to a query definition.
///
/// Grouping-only parts (aggregations, GROUP BY, HAVING) are emitted only when
/// `group_by_active` is set; `filter_group_count` is clamped to 1..=3.
pub fn build_definition(
    fields: &[UiField],
    joins: &[JoinClause],
    from: &str,
    group_by_active: bool,
    filter_group_count: usize,
) -> QueryDefinition {
    let select = fields
        .iter()
        .filter(|f| f.is_visible && f.group_by_type != GroupByType::Where)
        .map(|f| build_select_field(f, group_by_active))
        .collect();

    let (group_by, having_groups) = if group_by_active {
        let having = collect_having_group(fields);
        let having_groups = if having.is_empty() {
            Vec::new()
        } else {
            vec![having]
        };
        (Some(build_group_by(fields)), Some(having_groups))
    } else {
        (None, None)
    };

    let order_by: Vec<OrderByClause> = fields
        .iter()
        .filter_map(|f| {
            f.sort_dir.map(|direction| OrderByClause {
                table: f.table.clone(),
                column: f.column.clone(),
                direction,
            })
        })
        .collect();

    QueryDefinition {
        from: from.to_string(),
        joins: joins.to_vec(),
        select,
        group_by,
        has_group_by_field: group_by_active
            && fields.iter().any(|f| f.group_by_type == GroupByType::GroupBy),
        where_groups: collect_where_groups(fields, filter_group_count),
        having_groups,
        order_by: (!order_by.is_empty()).then_some(order_by),
    }
}

fn build_select_field(field: &UiField, group_by_active: bool) -> SelectField {
    let mut select = SelectField::column(&field.table, &field.column);
    select.alias = field.alias().map(str::to_string);
    match field.group_by_type {
        GroupByType::Aggregate(agg) if group_by_active => select.aggregation = Some(agg),
        GroupByType::Expression => {
            select.expression = Some(field.expression().unwrap_or_default().to_string());
        }
        _ => {}
    }
    select
}

/// Grouped columns, plus scalar expressions. Aggregate expressions cannot
/// appear in GROUP BY and are skipped.
fn build_group_by(fields: &[UiField]) -> Vec<GroupByItem> {
    let mut items: Vec<GroupByItem> = Vec::new();
    for field in fields {
        let item = match field.group_by_type {
            GroupByType::GroupBy => Some(column_item(field)),
            GroupByType::Expression => match field.expression() {
                Some(expr) if is_aggregate_expression(expr) => None,
                Some(expr) => Some(GroupByItem::Expression {
                    sql: expr.to_string(),
                }),
                None => Some(column_item(field)),
            },
            GroupByType::Where | GroupByType::Aggregate(_) => None,
        };
        if let Some(item) = item {
            if !items.contains(&item) {
                items.push(item);
            }
        }
    }
    items
}

fn column_item(field: &UiField) -> GroupByItem {
    GroupByItem::Column {
        table: field.table.clone(),
        column: field.column.clone(),
    }
}
