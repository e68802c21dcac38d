use async_trait::async_trait;
use membench_types::{BackendKind, MemoryRecord, SessionKey, Turn};
use serde_json::json;

use crate::http::{records_from_array, unwrap_data, AuthScheme, JsonTransport};
use crate::payload::plain_messages;
use crate::{BackendConfig, BackendError, ConfigError, MemoryBackend};

/// Client for the mem0 platform API, optionally with graph memory enabled.
#[derive(Debug, Clone)]
pub struct Mem0Client {
    transport: JsonTransport,
    enable_graph: bool,
}

impl Mem0Client {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: JsonTransport::new(config, AuthScheme::Token)?,
            enable_graph: false,
        })
    }

    pub fn with_graph(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            enable_graph: true,
            ..Self::new(config)?
        })
    }
}

#[async_trait]
impl MemoryBackend for Mem0Client {
    fn kind(&self) -> BackendKind {
        if self.enable_graph {
            BackendKind::Mem0Graph
        } else {
            BackendKind::Mem0
        }
    }

    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError> {
        let body = json!({
            "messages": plain_messages(turns),
            "user_id": session.as_str(),
            "timestamp": membench_core::current_unix_timestamp(),
            "version": "v2",
            "enable_graph": self.enable_graph,
        });
        self.transport.post("v1/memories/", &body).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        session: &SessionKey,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError> {
        let body = json!({
            "query": query,
            "filters": {"user_id": session.as_str()},
            "top_k": top_k,
            "version": "v2",
            "enable_graph": self.enable_graph,
        });
        let response = self.transport.post("v2/memories/search/", &body).await?;
        let payload = unwrap_data(&response);
        if payload.is_array() {
            return records_from_array(Some(payload), "results");
        }
        records_from_array(payload.get("results"), "results")
    }
}
