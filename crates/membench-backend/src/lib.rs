//! Memory backend adapters for membench runs.
//!
//! Every service sits behind [`MemoryBackend`], returns [`MemoryRecord`]s in a
//! uniform shape, and is selected once per run through [`build_backend`] or
//! [`resolve_backend`].

mod config;
mod context;
mod error;
mod http;
mod mem0;
mod memobase;
mod memos;
mod memu;
mod payload;
mod registry;
mod supermemory;

use async_trait::async_trait;

pub use config::{BackendConfig, DEFAULT_REQUEST_TIMEOUT_MS, REQUEST_TIMEOUT_ENV};
pub use context::{BackendContextRenderer, ContextError, ContextRenderer};
pub use error::{BackendError, ConfigError};
pub use mem0::Mem0Client;
pub use membench_types::{BackendKind, MemoryId, MemoryRecord, SessionKey, Turn};
pub use memobase::MemobaseClient;
pub use memos::{MemosApiClient, MemosApiOnlineClient, TOOL_TRAJECTORY_MEMORY};
pub use memu::MemuClient;
pub use payload::MAX_TURN_CHARS;
pub use registry::{build_backend, resolve_backend};
pub use supermemory::SupermemoryClient;

/// Capability contract shared by every memory service.
///
/// Implementations must be safe to call concurrently with distinct session keys.
/// Concurrent calls with the same key are left to the service.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Persists `turns` under `session`.
    async fn add(&self, turns: &[Turn], session: &SessionKey) -> Result<(), BackendError>;

    /// Returns up to `top_k` memories for `query`, most relevant first.
    async fn search(
        &self,
        query: &str,
        session: &SessionKey,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, BackendError>;
}
