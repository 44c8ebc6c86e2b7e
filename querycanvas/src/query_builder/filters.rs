use crate::models::{FilterState, GroupByType, UiField, FILTER_SLOTS};

use super::definition::WhereClause;

/// Clamp a requested filter group count to the available slots.
pub fn clamp_group_count(count: usize) -> usize {
    count.clamp(1, FILTER_SLOTS)
}

/// OR-groups of AND-ed predicates: group `i` gathers slot `i` of every field.
/// Groups with no set slot are dropped.
pub(crate) fn collect_where_groups(
    fields: &[UiField],
    filter_group_count: usize,
) -> Vec<Vec<WhereClause>> {
    (0..clamp_group_count(filter_group_count))
        .map(|idx| {
            fields
                .iter()
                .filter_map(|field| field.filter(idx).and_then(|f| predicate(field, f)))
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

/// Single group of HAVING predicates over aggregated or expression fields.
pub(crate) fn collect_having_group(fields: &[UiField]) -> Vec<WhereClause> {
    fields
        .iter()
        .filter(|field| field.group_by_type.accepts_having())
        .filter_map(|field| {
            let mut clause = predicate(field, field.having()?)?;
            clause.aggregation = field.group_by_type.aggregation();
            if field.group_by_type == GroupByType::Expression {
                clause.expression = field.expression().map(str::to_string);
            }
            Some(clause)
        })
        .collect()
}

fn predicate(field: &UiField, filter: &FilterState) -> Option<WhereClause> {
    let op = filter.op?;
    Some(WhereClause::new(&field.table, &field.column, op, &filter.val))
}
