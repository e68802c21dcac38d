use async_trait::async_trait;
use membench_types::{BackendKind, MemoryRecord, SessionKey, Turn};
use serde_json::json;

use crate::http::{records_from_array, unwrap_data, AuthScheme, JsonTransport};
use crate::payload::plain_messages;
use crate::{BackendConfig, BackendError, ConfigError, MemoryBackend};

const AGENT_NAME: &str = "membench";

/// Client for the memU memory service.
#[derive(Debug, Clone)]
pub struct MemuClient {
    transport: JsonTransport,
}

impl MemuClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: JsonTransport::new(config, AuthScheme::Bearer)?,
        })
    }
}

#[async_trait]
impl MemoryBackend for MemuClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Memu
    }

    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError> {
        let body = json!({
            "conversation": plain_messages(turns),
            "user_id": session.as_str(),
            "user_name": session.as_str(),
            "agent_id": AGENT_NAME,
            "agent_name": AGENT_NAME,
            "session_date": membench_core::now_rfc3339(),
        });
        self.transport.post("api/v1/memory/memorize", &body).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        session: &SessionKey,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError> {
        let body = json!({
            "user_id": session.as_str(),
            "agent_id": AGENT_NAME,
            "query": query,
            "top_k": top_k,
        });
        let response = self
            .transport
            .post("api/v1/memory/retrieve/related-memory-items", &body)
            .await?;
        let payload = unwrap_data(&response);
        match payload.get("related_memories") {
            Some(memories) => records_from_array(Some(memories), "related_memories"),
            None => records_from_array(payload.get("results"), "results"),
        }
    }
}
