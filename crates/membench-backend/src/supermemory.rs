use async_trait::async_trait;
use membench_types::{BackendKind, MemoryRecord, SessionKey, Turn};
use serde_json::json;

use crate::http::{records_from_array, unwrap_data, AuthScheme, JsonTransport};
use crate::payload::timestamped_messages;
use crate::{BackendConfig, BackendError, ConfigError, MemoryBackend};

/// Client for the Supermemory document API.
#[derive(Debug, Clone)]
pub struct SupermemoryClient {
    transport: JsonTransport,
}

impl SupermemoryClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: JsonTransport::new(config, AuthScheme::Bearer)?,
        })
    }
}

#[async_trait]
impl MemoryBackend for SupermemoryClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Supermemory
    }

    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError> {
        let chat_time = membench_core::now_rfc3339();
        let transcript = serde_json::to_string(&timestamped_messages(turns, &chat_time))?;
        let body = json!({
            "content": transcript,
            "containerTags": [session.as_str()],
        });
        self.transport.post("v3/documents", &body).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        session: &SessionKey,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError> {
        let body = json!({
            "q": query,
            "containerTag": session.as_str(),
            "limit": top_k,
        });
        let response = self.transport.post("v4/search", &body).await?;
        records_from_array(unwrap_data(&response).get("results"), "results")
    }
}
