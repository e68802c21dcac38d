use async_trait::async_trait;
use membench_types::{BackendKind, MemoryRecord, SessionKey, Turn};
use serde_json::json;

use crate::http::{records_from_array, unwrap_data, AuthScheme, JsonTransport};
use crate::payload::timestamped_messages;
use crate::{BackendConfig, BackendError, ConfigError, MemoryBackend};

/// Client for a Memobase server.
#[derive(Debug, Clone)]
pub struct MemobaseClient {
    transport: JsonTransport,
}

impl MemobaseClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: JsonTransport::new(config, AuthScheme::Bearer)?,
        })
    }
}

#[async_trait]
impl MemoryBackend for MemobaseClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Memobase
    }

    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError> {
        let chat_time = membench_core::now_rfc3339();
        let body = json!({
            "user_id": session.as_str(),
            "blob_type": "chat",
            "blob_data": {"messages": timestamped_messages(turns, &chat_time)},
        });
        self.transport.post("api/v1/blobs/insert", &body).await?;
        let flush = json!({"user_id": session.as_str(), "blob_type": "chat"});
        self.transport.post("api/v1/users/buffer/flush", &flush).await?;
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
            "query": query,
            "top_k": top_k,
        });
        let response = self.transport.post("api/v1/users/search", &body).await?;
        let payload = unwrap_data(&response);
        match payload.get("memories") {
            Some(memories) => records_from_array(Some(memories), "memories"),
            None => records_from_array(payload.get("results"), "results"),
        }
    }
}
