//! Integration tests for end-to-end SQL generation.
//!
//! These go through `recompute`, the same path the editor uses after every
//! change.

mod common;

use common::{field, field_with_filter, grouped, state, tracker_schema};
use querycanvas::models::{
    Aggregation, FilterState, GroupByType, Operator, SavedQueryState, SortDirection,
};
use querycanvas::query_builder::QueryDefinition;
use querycanvas::{build_select_query, recompute, QueryCanvasError};

fn sql_for(state: &SavedQueryState) -> String {
    recompute(&tracker_schema(), state, false).unwrap().sql
}

fn grouping(mut state: SavedQueryState) -> SavedQueryState {
    state.is_group_by_active = true;
    state
}

// ============================================================================
// Joins and projection
// ============================================================================

#[test]
fn bridge_table_joins_render_in_order() {
    let sql = sql_for(&state(vec![
        field("f1", "users", "user_id"),
        field("f2", "roles", "role_name"),
    ]));
    assert_eq!(
        sql,
        "SELECT users.user_id, roles.role_name\n\
         FROM users\n\
         INNER JOIN user_roles ON users.user_id = user_roles.user_id\n\
         INNER JOIN roles ON user_roles.role_id = roles.role_id;"
    );
}

#[test]
fn empty_canvas_selects_star_from_first_table() {
    assert_eq!(sql_for(&SavedQueryState::default()), "SELECT *\nFROM users;");
}

#[test]
fn quoting_applies_to_every_identifier() {
    let state = state(vec![
        field("f1", "users", "user_id"),
        field("f2", "roles", "role_name"),
    ]);
    let sql = recompute(&tracker_schema(), &state, true).unwrap().sql;
    let unquoted = recompute(&tracker_schema(), &state, false).unwrap().sql;
    assert_eq!(sql.replace('"', ""), unquoted);
    assert!(sql.starts_with("SELECT \"users\".\"user_id\", \"roles\".\"role_name\"\nFROM \"users\"\n"));
    assert!(sql.contains(
        "INNER JOIN \"user_roles\" ON \"users\".\"user_id\" = \"user_roles\".\"user_id\""
    ));
}

#[test]
fn aliases_hidden_and_filter_only_fields() {
    let mut email = field("f1", "users", "email");
    email.alias = "owner_email".to_string();
    let mut hidden = field("f2", "users", "user_id");
    hidden.is_visible = false;
    let filter_only = grouped(
        field_with_filter("f3", "users", "is_admin", Operator::Eq, "yes"),
        GroupByType::Where,
    );

    let sql = sql_for(&state(vec![email, hidden, filter_only]));
    assert_eq!(
        sql,
        "SELECT users.email AS owner_email\nFROM users\nWHERE (users.is_admin = true);"
    );
}

#[test]
fn orphaned_fields_are_dropped_with_warning() {
    let sql = sql_for(&state(vec![
        field("f1", "users", "email"),
        field("f2", "audit_log", "message"),
    ]));
    assert_eq!(
        sql,
        "SELECT users.email\nFROM users;\n\n-- ⚠️ Warnings:\n-- No join path found from \"users\" to \"audit_log\""
    );
}

// ============================================================================
// WHERE
// ============================================================================

#[test]
fn like_filter_wraps_value() {
    let sql = sql_for(&state(vec![field_with_filter(
        "f1",
        "projects",
        "project_name",
        Operator::Like,
        "Banque",
    )]));
    assert!(sql.contains("WHERE (projects.project_name LIKE '%Banque%')"));
}

#[test]
fn filter_slots_form_or_groups() {
    let mut status = field_with_filter("f1", "tasks", "status", Operator::Eq, "open");
    status.set_filter(1, FilterState::new(Operator::Eq, "blocked"));
    let due = field_with_filter("f2", "tasks", "due_date", Operator::Lt, "31/12/2024");

    let mut query = state(vec![status, due]);
    let sql = sql_for(&query);
    assert!(sql.contains("WHERE (tasks.status = 'open' AND tasks.due_date < '2024-12-31');"));

    query.filter_group_count = 2;
    let sql = sql_for(&query);
    assert!(sql.contains(
        "WHERE (tasks.status = 'open' AND tasks.due_date < '2024-12-31') OR (tasks.status = 'blocked')"
    ));
}

#[test]
fn values_are_escaped_by_column_type() {
    let sql = sql_for(&state(vec![
        field_with_filter("f1", "projects", "budget", Operator::Gte, "1000.50"),
        field_with_filter("f2", "projects", "project_name", Operator::Neq, "O'Brien"),
        field_with_filter("f3", "projects", "project_id", Operator::In, "1, 2,3"),
        field_with_filter("f4", "projects", "owner_id", Operator::IsNull, ""),
    ]));
    assert!(sql.contains(
        "WHERE (projects.budget >= 1000.50 AND projects.project_name != 'O''Brien' \
         AND projects.project_id IN (1, 2, 3) AND projects.owner_id IS NULL)"
    ));
}

#[test]
fn non_numeric_value_for_numeric_column_is_quoted() {
    let sql = sql_for(&state(vec![field_with_filter(
        "f1",
        "projects",
        "budget",
        Operator::Eq,
        "lots",
    )]));
    assert!(sql.contains("projects.budget = 'lots'"));
}

#[test]
fn date_functions_and_raw_sql_pass_through() {
    let sql = sql_for(&state(vec![
        field_with_filter("f1", "tasks", "due_date", Operator::Lt, "now()"),
        field_with_filter(
            "f2",
            "tasks",
            "task_id",
            Operator::Sql,
            "BETWEEN 10 AND 20",
        ),
    ]));
    assert!(sql.contains("WHERE (tasks.due_date < now() AND tasks.task_id BETWEEN 10 AND 20)"));
}

// ============================================================================
// GROUP BY / HAVING / ORDER BY
// ============================================================================

#[test]
fn having_on_counted_field() {
    let mut status = grouped(
        field("f1", "tasks", "status"),
        GroupByType::Aggregate(Aggregation::Count),
    );
    status.having = Some(FilterState::new(Operator::Gt, "5"));
    let project = field("f2", "tasks", "project_id");

    let sql = sql_for(&grouping(state(vec![status, project])));
    assert_eq!(
        sql,
        "SELECT COUNT(tasks.status), tasks.project_id\n\
         FROM tasks\n\
         GROUP BY tasks.project_id\n\
         HAVING COUNT(tasks.status) > 5;"
    );
}

#[test]
fn having_without_grouped_field_is_an_error() {
    let mut status = grouped(
        field("f1", "tasks", "status"),
        GroupByType::Aggregate(Aggregation::Count),
    );
    status.having = Some(FilterState::new(Operator::Gt, "5"));

    let sql = sql_for(&grouping(state(vec![status])));
    assert!(sql.starts_with("-- ⚠️ Error: HAVING requires at least one field to be grouped"));
}

#[test]
fn having_with_only_scalar_expression_grouped_is_an_error() {
    let mut status = grouped(
        field("f1", "tasks", "status"),
        GroupByType::Aggregate(Aggregation::Count),
    );
    status.having = Some(FilterState::new(Operator::Gt, "5"));
    let mut upper = grouped(field("f2", "tasks", "*"), GroupByType::Expression);
    upper.expression = Some("UPPER(tasks.status)".to_string());

    let sql = sql_for(&grouping(state(vec![status, upper])));
    assert!(sql.starts_with("-- ⚠️ Error: HAVING requires at least one field to be grouped"));
}

#[test]
fn aggregations_only_apply_while_grouping() {
    let fields = vec![
        grouped(field("f1", "users", "is_admin"), GroupByType::Aggregate(Aggregation::Sum)),
        field("f2", "users", "email"),
    ];

    let flat = sql_for(&state(fields.clone()));
    assert_eq!(flat, "SELECT users.is_admin, users.email\nFROM users;");

    let sql = sql_for(&grouping(state(fields)));
    assert_eq!(
        sql,
        "SELECT SUM(users.is_admin::int), users.email\nFROM users\nGROUP BY users.email;"
    );
}

#[test]
fn count_star_is_not_qualified() {
    let fields = vec![
        field("f1", "tasks", "project_id"),
        grouped(field("f2", "tasks", "*"), GroupByType::Aggregate(Aggregation::Count)),
    ];
    let sql = sql_for(&grouping(state(fields)));
    assert!(sql.starts_with("SELECT tasks.project_id, COUNT(*)\n"));
}

#[test]
fn iif_expression_is_transpiled_and_grouped() {
    let mut flag = grouped(field("f2", "tasks", "*"), GroupByType::Expression);
    flag.expression = Some("IIF(tasks.status = 'done', 'closed', 'open')".to_string());
    flag.alias = "state".to_string();
    let fields = vec![
        grouped(field("f1", "tasks", "task_id"), GroupByType::Aggregate(Aggregation::Count)),
        flag,
    ];

    let sql = sql_for(&grouping(state(fields)));
    let case = "CASE WHEN tasks.status = 'done' THEN 'closed' ELSE 'open' END";
    assert!(sql.contains(&format!("SELECT COUNT(tasks.task_id), {case} AS state\n")));
    assert!(sql.contains(&format!("GROUP BY {case}")));
}

#[test]
fn aggregate_expressions_stay_out_of_group_by() {
    let mut total = grouped(field("f2", "projects", "*"), GroupByType::Expression);
    total.expression = Some("SUM(projects.budget) / 100".to_string());
    total.having = Some(FilterState::new(Operator::Gt, "10"));
    let fields = vec![field("f1", "projects", "owner_id"), total];

    let sql = sql_for(&grouping(state(fields)));
    assert!(sql.contains("GROUP BY projects.owner_id\n"));
    assert!(sql.contains("HAVING SUM(projects.budget) / 100 > 10;"));
}

#[test]
fn order_by_uses_aggregate_expression() {
    let mut count = grouped(
        field("f2", "tasks", "task_id"),
        GroupByType::Aggregate(Aggregation::Count),
    );
    count.sort_dir = Some(SortDirection::Desc);
    let mut project = field("f1", "tasks", "project_id");
    project.sort_dir = Some(SortDirection::Asc);

    let sql = sql_for(&grouping(state(vec![project, count])));
    assert!(sql.ends_with("ORDER BY tasks.project_id ASC, COUNT(tasks.task_id) DESC;"));
}

#[test]
fn order_by_ungrouped_column_is_an_error() {
    let mut status = grouped(field("f2", "tasks", "status"), GroupByType::Where);
    status.sort_dir = Some(SortDirection::Asc);
    let fields = vec![field("f1", "tasks", "project_id"), status];

    let sql = sql_for(&grouping(state(fields)));
    assert!(sql.starts_with("-- ⚠️ Error: ORDER BY tasks.status"));
}

// ============================================================================
// Direct rendering
// ============================================================================

#[test]
fn unknown_from_table_is_rejected() {
    let err = build_select_query(&QueryDefinition::new("ghosts"), &tracker_schema(), false)
        .unwrap_err();
    assert!(matches!(err, QueryCanvasError::Sql(_)));

    let err = build_select_query(&QueryDefinition::new(" "), &tracker_schema(), false)
        .unwrap_err();
    assert!(matches!(err, QueryCanvasError::Sql(_)));
}
