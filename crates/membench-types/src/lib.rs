//! Shared data types for membench ingestion and search runs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

mod backend_kind;

pub use backend_kind::{BackendKind, BackendKindParseError};

/// Run version used in session keys when `VERSION` is unset.
pub const DEFAULT_RUN_VERSION: &str = "default_version";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TurnRole {
    System,
    User,
    Assistant,
    Tool,
    Other(String),
}

impl TurnRole {
    pub fn as_str(&self) -> &str {
        match self {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::Tool => "tool",
            TurnRole::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for TurnRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "system" => TurnRole::System,
            "user" => TurnRole::User,
            "assistant" => TurnRole::Assistant,
            "tool" => TurnRole::Tool,
            _ => TurnRole::Other(value),
        }
    }
}

impl From<TurnRole> for String {
    fn from(value: TurnRole) -> Self {
        match value {
            TurnRole::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// One role/content message of a benchmark conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    #[serde(default)]
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Work carried by a task: turns to ingest or queries to search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPayload {
    Conversation(Vec<Turn>),
    Queries(Vec<String>),
}

/// Unit of work dispatched to a memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub payload: TaskPayload,
}

impl Task {
    pub fn conversation(id: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            id: id.into(),
            payload: TaskPayload::Conversation(turns),
        }
    }

    pub fn queries(id: impl Into<String>, queries: Vec<String>) -> Self {
        Self {
            id: id.into(),
            payload: TaskPayload::Queries(queries),
        }
    }

    /// Turns to ingest; empty for search tasks.
    pub fn turns(&self) -> &[Turn] {
        match &self.payload {
            TaskPayload::Conversation(turns) => turns,
            TaskPayload::Queries(_) => &[],
        }
    }

    /// Sub-queries for the search path. Conversations yield their user turns.
    pub fn query_list(&self) -> Vec<String> {
        match &self.payload {
            TaskPayload::Queries(queries) => queries.clone(),
            TaskPayload::Conversation(turns) => turns
                .iter()
                .filter(|turn| turn.role == TurnRole::User)
                .map(|turn| turn.content.clone())
                .collect(),
        }
    }

    pub fn session_key(&self, kind: BackendKind, version: &str) -> SessionKey {
        SessionKey::derive(&self.id, kind, version)
    }
}

/// Backend namespace for one task; stable across resumed runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn derive(task_id: &str, kind: BackendKind, version: &str) -> Self {
        Self(format!("{task_id}_{}_{version}", kind.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryRecordError {
    #[error("memory record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Memory identifier as the backend sent it. The JSON kind is part of the
/// identity, so `1` and `"1"` are different memories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemoryId {
    Text(String),
    Number(String),
}

impl MemoryId {
    pub fn as_str(&self) -> &str {
        match self {
            MemoryId::Text(id) | MemoryId::Number(id) => id,
        }
    }
}

/// Backend memory normalized to a JSON object with an optional identifier.
///
/// Serializes back to the exact object the backend returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct MemoryRecord {
    id: Option<MemoryId>,
    body: Map<String, Value>,
}

impl MemoryRecord {
    pub fn from_value(value: Value) -> Result<Self, MemoryRecordError> {
        match value {
            Value::Object(body) => Ok(Self::from_map(body)),
            Value::Null => Err(MemoryRecordError::NotAnObject("null")),
            Value::Bool(_) => Err(MemoryRecordError::NotAnObject("bool")),
            Value::Number(_) => Err(MemoryRecordError::NotAnObject("number")),
            Value::String(_) => Err(MemoryRecordError::NotAnObject("string")),
            Value::Array(_) => Err(MemoryRecordError::NotAnObject("array")),
        }
    }

    pub fn from_map(body: Map<String, Value>) -> Self {
        let id = match body.get("id") {
            Some(Value::String(id)) => Some(MemoryId::Text(id.clone())),
            Some(Value::Number(id)) => Some(MemoryId::Number(id.to_string())),
            _ => None,
        };
        Self { id, body }
    }

    /// Identifier rendered as text, for logs and display.
    pub fn id(&self) -> Option<&str> {
        self.id.as_ref().map(MemoryId::as_str)
    }

    /// Deduplication key. Records without an id share a bucket.
    pub fn memory_id(&self) -> Option<&MemoryId> {
        self.id.as_ref()
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Looks up a string field, following `a.b` paths through nested objects.
    pub fn str_field(&self, path: &str) -> Option<&str> {
        let mut segments = path.split('.');
        let mut current = self.body.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        current.as_str()
    }
}

impl TryFrom<Value> for MemoryRecord {
    type Error = MemoryRecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<MemoryRecord> for Value {
    fn from(record: MemoryRecord) -> Self {
        Value::Object(record.body)
    }
}

/// Per-task search outcome appended to the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub questions: Vec<String>,
    pub memories: Vec<MemoryRecord>,
    pub mem_context: String,
}

/// Ingestion dataset line: `{"sample_id": .., "trajectory": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub sample_id: String,
    #[serde(default)]
    pub trajectory: Vec<Turn>,
}

impl From<IngestionRecord> for Task {
    fn from(record: IngestionRecord) -> Self {
        Task::conversation(record.sample_id, record.trajectory)
    }
}

/// Search dataset line: `{"id": .., "question": [[..], ..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub id: String,
    #[serde(default)]
    pub question: Vec<Vec<Turn>>,
}

impl SearchEntry {
    /// User turn contents in round order, then turn order.
    pub fn user_queries(&self) -> Vec<String> {
        self.question
            .iter()
            .flatten()
            .filter(|turn| turn.role == TurnRole::User)
            .map(|turn| turn.content.clone())
            .collect()
    }
}

impl From<SearchEntry> for Task {
    fn from(entry: SearchEntry) -> Self {
        let queries = entry.user_queries();
        Task::queries(entry.id, queries)
    }
}
