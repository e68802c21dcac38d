//! Backend selection from a configuration selector.
//!
//! Resolution happens once per run, before any worker starts, so an unknown
//! selector or missing endpoint fails the run without touching a task.

use std::sync::Arc;

use membench_types::BackendKind;
use tracing::info;

use crate::{
    BackendConfig, ConfigError, Mem0Client, MemobaseClient, MemoryBackend, MemosApiClient,
    MemosApiOnlineClient, MemuClient, SupermemoryClient,
};

/// Builds the adapter for `kind` from explicit configuration.
pub fn build_backend(
    kind: BackendKind,
    config: &BackendConfig,
) -> Result<Arc<dyn MemoryBackend>, ConfigError> {
    let backend: Arc<dyn MemoryBackend> = match kind {
        BackendKind::Mem0 => Arc::new(Mem0Client::new(config)?),
        BackendKind::Mem0Graph => Arc::new(Mem0Client::with_graph(config)?),
        BackendKind::MemosApi => Arc::new(MemosApiClient::new(config)?),
        BackendKind::MemosApiOnline => Arc::new(MemosApiOnlineClient::new(config)?),
        BackendKind::Memobase => Arc::new(MemobaseClient::new(config)?),
        BackendKind::Memu => Arc::new(MemuClient::new(config)?),
        BackendKind::Supermemory => Arc::new(SupermemoryClient::new(config)?),
    };
    Ok(backend)
}

/// Parses `selector` and builds its adapter from `MEMBENCH_*` environment values.
pub fn resolve_backend(selector: &str) -> Result<Arc<dyn MemoryBackend>, ConfigError> {
    let kind = selector.parse::<BackendKind>()?;
    let config = BackendConfig::from_env(kind)?;
    info!(backend = %kind, base_url = %config.base_url, "resolved memory backend");
    build_backend(kind, &config)
}
