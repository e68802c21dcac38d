use async_trait::async_trait;
use membench_types::{BackendKind, MemoryRecord, SessionKey, Turn};
use serde_json::{json, Value};

use crate::http::{records_from_array, unwrap_data, AuthScheme, JsonTransport};
use crate::payload::plain_messages;
use crate::{BackendConfig, BackendError, ConfigError, MemoryBackend};

pub const TOOL_TRAJECTORY_MEMORY: &str = "ToolTrajectoryMemory";

/// Client for a self-hosted MemOS product API.
#[derive(Debug, Clone)]
pub struct MemosApiClient {
    transport: JsonTransport,
}

impl MemosApiClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: JsonTransport::new(config, AuthScheme::Token)?,
        })
    }
}

#[async_trait]
impl MemoryBackend for MemosApiClient {
    fn kind(&self) -> BackendKind {
        BackendKind::MemosApi
    }

    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError> {
        let body = json!({
            "user_id": session.as_str(),
            "mem_cube_id": session.as_str(),
            "messages": plain_messages(turns),
            "conv_id": "",
        });
        self.transport.post("product/add", &body).await?;
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
            "user_id": session.as_str(),
            "mem_cube_id": session.as_str(),
            "top_k": top_k,
        });
        let response = self.transport.post("product/search", &body).await?;
        tool_trajectory_records(unwrap_data(&response))
    }
}

/// Client for the hosted MemOS cloud API.
#[derive(Debug, Clone)]
pub struct MemosApiOnlineClient {
    transport: JsonTransport,
}

impl MemosApiOnlineClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            transport: JsonTransport::new(config, AuthScheme::Token)?,
        })
    }
}

#[async_trait]
impl MemoryBackend for MemosApiOnlineClient {
    fn kind(&self) -> BackendKind {
        BackendKind::MemosApiOnline
    }

    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError> {
        let body = json!({
            "user_id": session.as_str(),
            "messages": plain_messages(turns),
        });
        self.transport.post("add/message", &body).await?;
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
            "user_id": session.as_str(),
            "memory_limit_number": top_k,
        });
        let response = self.transport.post("search/memory", &body).await?;
        let payload = unwrap_data(&response);
        if let Some(list) = payload.get("memory_detail_list") {
            return records_from_array(Some(list), "memory_detail_list");
        }
        tool_trajectory_records(payload)
    }
}

/// Extracts `tool_mem[0].memories`, keeping only tool trajectory memories.
fn tool_trajectory_records(payload: &Value) -> Result<Vec<MemoryRecord>, BackendError> {
    let Some(buckets) = payload.get("tool_mem").and_then(Value::as_array) else {
        return Err(BackendError::InvalidResponse(
            "response is missing array 'tool_mem'".to_string(),
        ));
    };
    let Some(first) = buckets.first() else {
        return Ok(Vec::new());
    };
    let records = records_from_array(first.get("memories"), "tool_mem[0].memories")?;
    Ok(records
        .into_iter()
        .filter(|record| record.str_field("metadata.memory_type") == Some(TOOL_TRAJECTORY_MEMORY))
        .collect())
}
