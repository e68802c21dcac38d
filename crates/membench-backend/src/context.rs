//! Backend-specific rendering of deduplicated memories into evaluator context.

use membench_types::{BackendKind, MemoryRecord};
use serde_json::Value;
use thiserror::Error;

use crate::memos::TOOL_TRAJECTORY_MEMORY;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("memory #{index} is missing field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

/// Turns a deduplicated memory list into the text handed to the evaluator.
pub trait ContextRenderer: Send + Sync {
    fn render(&self, memories: &[MemoryRecord]) -> Result<String, ContextError>;
}

/// Default renderer for each backend's memory shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendContextRenderer {
    kind: BackendKind,
}

impl BackendContextRenderer {
    pub fn new(kind: BackendKind) -> Self {
        Self { kind }
    }
}

impl ContextRenderer for BackendContextRenderer {
    fn render(&self, memories: &[MemoryRecord]) -> Result<String, ContextError> {
        let rendered = match self.kind {
            BackendKind::MemosApi | BackendKind::MemosApiOnline => render_tool_memories(memories)?,
            BackendKind::Mem0 | BackendKind::Mem0Graph => memories
                .iter()
                .enumerate()
                .map(|(index, memory)| {
                    Ok(format!(
                        "{}: {}",
                        required_text(memory, index, "created_at")?,
                        required_text(memory, index, "memory")?
                    ))
                })
                .collect::<Result<Vec<_>, ContextError>>()?
                .join("\n"),
            BackendKind::Supermemory | BackendKind::Memobase | BackendKind::Memu => memories
                .iter()
                .enumerate()
                .map(|(index, memory)| required_text(memory, index, "memory"))
                .collect::<Result<Vec<_>, ContextError>>()?
                .join("\n"),
        };
        Ok(rendered.trim().to_string())
    }
}

fn render_tool_memories(memories: &[MemoryRecord]) -> Result<String, ContextError> {
    let lines = memories
        .iter()
        .enumerate()
        .filter(|(_, memory)| {
            memory.str_field("metadata.memory_type") == Some(TOOL_TRAJECTORY_MEMORY)
        })
        .enumerate()
        .map(|(position, (index, memory))| {
            let metadata = memory.field("metadata");
            let experience = metadata
                .and_then(|metadata| metadata.get("experience"))
                .ok_or(ContextError::MissingField {
                    index,
                    field: "metadata.experience",
                })?;
            let status = metadata
                .and_then(|metadata| metadata.get("tool_used_status"))
                .ok_or(ContextError::MissingField {
                    index,
                    field: "metadata.tool_used_status",
                })?;
            Ok(format!(
                "{}. tool_trajectory: {}\nexperience: {}\ntool_used_status: {}",
                position + 1,
                required_text(memory, index, "memory")?,
                display_value(experience),
                status
            ))
        })
        .collect::<Result<Vec<_>, ContextError>>()?;

    if lines.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("Tool Memory:\n{}", lines.join("\n")))
}

fn required_text(
    memory: &MemoryRecord,
    index: usize,
    field: &'static str,
) -> Result<String, ContextError> {
    memory
        .field(field)
        .map(display_value)
        .ok_or(ContextError::MissingField { index, field })
}

/// Strings render bare; everything else renders as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendContextRenderer, ContextError, ContextRenderer};
    use membench_types::{BackendKind, MemoryRecord};
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<MemoryRecord> {
        values
            .into_iter()
            .map(|value| MemoryRecord::from_value(value).expect("object"))
            .collect()
    }

    #[test]
    fn mem0_renders_timestamped_lines() {
        let memories = records(vec![
            json!({"id": "1", "memory": "likes tea", "created_at": "2025-01-01"}),
            json!({"id": "2", "memory": "owns a cat", "created_at": "2025-01-02"}),
        ]);
        let rendered = BackendContextRenderer::new(BackendKind::Mem0)
            .render(&memories)
            .expect("render");
        assert_eq!(rendered, "2025-01-01: likes tea\n2025-01-02: owns a cat");
    }

    #[test]
    fn memos_renders_only_tool_trajectories_with_status_json() {
        let memories = records(vec![
            json!({"id": "f", "memory": "fact", "metadata": {"memory_type": "LongTermMemory"}}),
            json!({
                "id": "t",
                "memory": "called ls",
                "metadata": {
                    "memory_type": "ToolTrajectoryMemory",
                    "experience": "list first",
                    "tool_used_status": [{"used_tool": "ls"}]
                }
            }),
        ]);
        let rendered = BackendContextRenderer::new(BackendKind::MemosApi)
            .render(&memories)
            .expect("render");
        assert_eq!(
            rendered,
            "Tool Memory:\n1. tool_trajectory: called ls\nexperience: list first\ntool_used_status: [{\"used_tool\":\"ls\"}]"
        );
    }

    #[test]
    fn memos_without_tool_memories_renders_empty() {
        let memories = records(vec![json!({"id": "f", "memory": "fact"})]);
        let rendered = BackendContextRenderer::new(BackendKind::MemosApiOnline)
            .render(&memories)
            .expect("render");
        assert_eq!(rendered, "");
    }

    #[test]
    fn missing_field_is_reported_with_index() {
        let memories = records(vec![
            json!({"id": "1", "memory": "ok"}),
            json!({"id": "2", "content": "no memory key"}),
        ]);
        let error = BackendContextRenderer::new(BackendKind::Supermemory)
            .render(&memories)
            .expect_err("should fail");
        assert_eq!(
            error,
            ContextError::MissingField {
                index: 1,
                field: "memory"
            }
        );
    }
}
