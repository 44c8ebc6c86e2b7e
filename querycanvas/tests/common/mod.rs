//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use querycanvas::models::{FilterState, GroupByType, Operator, SavedQueryState, UiField};
use querycanvas::Schema;

/// Project tracker schema:
/// `users ← user_roles → roles`, `projects.owner_id → users`,
/// `tasks.project_id → projects`, `tasks.assignee_id → users`, plus an
/// unconnected `audit_log`.
pub const TRACKER_SCHEMA: &str = r#"[
  {
    "table_name": "users",
    "columns": [
      {"column_name": "user_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "email", "data_type": "text", "is_nullable": "NO"},
      {"column_name": "is_admin", "data_type": "boolean", "is_nullable": "NO"},
      {"column_name": "last_login", "data_type": "timestamp", "is_nullable": "YES"}
    ],
    "primary_key": ["user_id"],
    "foreign_keys": null
  },
  {
    "table_name": "roles",
    "columns": [
      {"column_name": "role_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "role_name", "data_type": "text", "is_nullable": "NO"}
    ],
    "primary_key": ["role_id"],
    "foreign_keys": []
  },
  {
    "table_name": "user_roles",
    "columns": [
      {"column_name": "user_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "role_id", "data_type": "integer", "is_nullable": "NO"}
    ],
    "primary_key": ["user_id", "role_id"],
    "foreign_keys": [
      {"column": "user_id", "ref_table": "users", "ref_column": "user_id"},
      {"column": "role_id", "ref_table": "roles", "ref_column": "role_id"}
    ]
  },
  {
    "table_name": "projects",
    "columns": [
      {"column_name": "project_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "project_name", "data_type": "text", "is_nullable": "NO"},
      {"column_name": "owner_id", "data_type": "integer", "is_nullable": "YES"},
      {"column_name": "budget", "data_type": "numeric(12,2)", "is_nullable": "YES"}
    ],
    "primary_key": ["project_id"],
    "foreign_keys": [
      {"column": "owner_id", "ref_table": "users", "ref_column": "user_id"}
    ]
  },
  {
    "table_name": "tasks",
    "columns": [
      {"column_name": "task_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "project_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "assignee_id", "data_type": "integer", "is_nullable": "YES"},
      {"column_name": "status", "data_type": "text", "is_nullable": "NO"},
      {"column_name": "due_date", "data_type": "date", "is_nullable": "YES"}
    ],
    "primary_key": ["task_id"],
    "foreign_keys": [
      {"column": "project_id", "ref_table": "projects", "ref_column": "project_id"},
      {"column": "assignee_id", "ref_table": "users", "ref_column": "user_id"}
    ]
  },
  {
    "table_name": "audit_log",
    "columns": [
      {"column_name": "log_id", "data_type": "integer", "is_nullable": "NO"},
      {"column_name": "user_id", "data_type": "integer", "is_nullable": "YES"},
      {"column_name": "message", "data_type": "text", "is_nullable": "YES"}
    ],
    "primary_key": ["log_id"]
  }
]"#;

pub fn tracker_schema() -> Schema {
    Schema::from_json_str(TRACKER_SCHEMA).unwrap()
}

pub fn field(id: &str, table: &str, column: &str) -> UiField {
    UiField::new(id, table, column)
}

pub fn field_with_filter(id: &str, table: &str, column: &str, op: Operator, val: &str) -> UiField {
    let mut f = UiField::new(id, table, column);
    f.set_filter(0, FilterState::new(op, val));
    f
}

pub fn grouped(mut f: UiField, group_by_type: GroupByType) -> UiField {
    f.group_by_type = group_by_type;
    f
}

pub fn state(fields: Vec<UiField>) -> SavedQueryState {
    SavedQueryState {
        fields,
        ..SavedQueryState::default()
    }
}
