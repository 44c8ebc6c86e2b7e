//! Workspaces: a schema plus the queries saved against it.

use serde::{Deserialize, Serialize};

use crate::error::{QueryCanvasError, Result};
use crate::models::{SavedQuery, SavedQueryState};
use crate::schema::Schema;
use crate::storage::KeyValueStore;

const WORKSPACE_KEY_PREFIX: &str = "workspace-";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub name: String,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub saved_queries: Vec<SavedQuery>,
}

impl Workspace {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            saved_queries: Vec::new(),
        }
    }

    /// Insert or replace the query named `name`. Returns its id.
    pub fn save_query(&mut self, name: &str, state: SavedQueryState) -> String {
        if let Some(existing) = self.saved_queries.iter_mut().find(|q| q.name == name) {
            existing.state = state;
            return existing.id.clone();
        }
        let id = self.next_query_id();
        self.saved_queries.push(SavedQuery {
            id: id.clone(),
            name: name.to_string(),
            state,
        });
        id
    }

    pub fn find_query(&self, id: &str) -> Option<&SavedQuery> {
        self.saved_queries.iter().find(|q| q.id == id)
    }

    pub fn delete_query(&mut self, id: &str) -> Result<SavedQuery> {
        let idx = self
            .saved_queries
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QueryCanvasError::Validation(format!("unknown saved query {id}")))?;
        Ok(self.saved_queries.remove(idx))
    }

    /// Swap the schema. Saved queries may reference tables that no longer
    /// exist; they are kept and fail at render time instead.
    pub fn replace_schema(&mut self, schema: Schema) {
        tracing::info!(workspace = %self.name, tables = schema.tables().len(), "schema replaced");
        self.schema = schema;
    }

    fn next_query_id(&self) -> String {
        let max = self
            .saved_queries
            .iter()
            .filter_map(|q| q.id.strip_prefix("query-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("query-{}", max + 1)
    }
}

/// Loads and stores workspaces through a [`KeyValueStore`].
pub struct WorkspaceRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> WorkspaceRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(WORKSPACE_KEY_PREFIX).and_then(decode_name))
            .collect())
    }

    pub fn load(&self, name: &str) -> Result<Option<Workspace>> {
        match self.store.get(&workspace_key(name))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load `name`, or start an empty workspace when none is stored.
    pub fn load_or_default(&self, name: &str) -> Workspace {
        self.store.load(
            &workspace_key(name),
            Workspace::new(name, Schema::default()),
        )
    }

    pub fn save(&mut self, workspace: &Workspace) -> Result<()> {
        tracing::debug!(workspace = %workspace.name, "saving workspace");
        self.store.save(&workspace_key(&workspace.name), workspace)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.store.remove(&workspace_key(name))
    }
}

/// Store key for a workspace. Bytes outside `[A-Za-z0-9.-]` (including `_`)
/// are written as `_xx` so any name maps to a valid key and back.
fn workspace_key(name: &str) -> String {
    let mut key = String::from(WORKSPACE_KEY_PREFIX);
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            key.push(char::from(byte));
        } else {
            key.push_str(&format!("_{byte:02x}"));
        }
    }
    key
}

fn decode_name(encoded: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(encoded.len());
    let mut rest = encoded.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        if byte == b'_' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(byte);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}
