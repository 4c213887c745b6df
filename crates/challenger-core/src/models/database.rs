use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{to_canonical_string, Snapshot, SnapshotKind};

/// One todo row. Only `id` is interpreted; everything else is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TodoItem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

/// Todo database as served by `GET /challenger/database/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSnapshot {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataSnapshot {
    pub fn new(todos: Vec<TodoItem>) -> Self {
        Self {
            todos,
            extra: Map::new(),
        }
    }

    /// Put todos in canonical order, ascending by id. Stable for equal ids.
    pub fn sort_todos(&mut self) {
        self.todos.sort_by_key(|todo| todo.id);
    }

    pub fn sorted(&self) -> Self {
        let mut sorted = self.clone();
        sorted.sort_todos();
        sorted
    }

    pub fn ids(&self) -> Vec<i64> {
        self.todos.iter().map(|todo| todo.id).collect()
    }
}

impl Snapshot for DataSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Data;

    /// Server response order is not stable, so todos are sorted first.
    fn canonical_json(&self) -> serde_json::Result<String> {
        to_canonical_string(&self.sorted())
    }
}
