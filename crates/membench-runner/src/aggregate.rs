use std::collections::HashSet;
use std::sync::Arc;

use membench_backend::{ContextError, ContextRenderer, MemoryBackend};
use membench_types::{BackendKind, MemoryRecord, ResultRecord, Task};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("failed to render memory context: {0}")]
    Context(#[from] ContextError),
}

/// Keeps the first record per id, preserving order. Ids compare by JSON kind
/// and value; records without an id share one slot.
pub fn dedup_memories(memories: Vec<MemoryRecord>) -> Vec<MemoryRecord> {
    let mut seen = HashSet::new();
    memories
        .into_iter()
        .filter(|memory| seen.insert(memory.memory_id().cloned()))
        .collect()
}

/// Builds one [`ResultRecord`] per search task.
pub struct ResultAggregator {
    backend: Arc<dyn MemoryBackend>,
    renderer: Arc<dyn ContextRenderer>,
    kind: BackendKind,
    version: String,
    top_k: usize,
}

impl ResultAggregator {
    pub fn new(
        backend: Arc<dyn MemoryBackend>,
        renderer: Arc<dyn ContextRenderer>,
        version: impl Into<String>,
        top_k: usize,
    ) -> Self {
        let kind = backend.kind();
        Self {
            backend,
            renderer,
            kind,
            version: version.into(),
            top_k,
        }
    }

    /// Searches every sub-query in order, then dedups and renders. Never fails:
    /// sub-query errors drop that query's hits and render errors leave the
    /// context empty.
    pub async fn aggregate(&self, task: &Task) -> ResultRecord {
        let session = task.session_key(self.kind, &self.version);
        let questions = task.query_list();

        let mut collected = Vec::new();
        for (index, query) in questions.iter().enumerate() {
            match self.backend.search(query, &session, self.top_k).await {
                Ok(mut memories) => {
                    debug!(task_id = %task.id, query_index = index, hits = memories.len(), "sub-query finished");
                    collected.append(&mut memories);
                }
                Err(error) => {
                    warn!(
                        task_id = %task.id,
                        query = %preview(query),
                        %error,
                        "sub-query failed; skipping"
                    );
                }
            }
        }

        let memories = dedup_memories(collected);
        let mem_context = match self.render(&memories) {
            Ok(context) => context,
            Err(error) => {
                warn!(task_id = %task.id, %error, "context rendering failed; using empty context");
                String::new()
            }
        };

        ResultRecord {
            id: task.id.clone(),
            questions,
            memories,
            mem_context,
        }
    }

    fn render(&self, memories: &[MemoryRecord]) -> Result<String, AggregationError> {
        if memories.is_empty() {
            return Ok(String::new());
        }
        Ok(self.renderer.render(memories)?)
    }
}

fn preview(query: &str) -> String {
    let mut chars = query.chars();
    let head = chars.by_ref().take(50).collect::<String>();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
