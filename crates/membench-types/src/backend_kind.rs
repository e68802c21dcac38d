use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory services a run can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "mem0")]
    Mem0,
    #[serde(rename = "mem0_graph")]
    Mem0Graph,
    #[serde(rename = "memos-api")]
    MemosApi,
    #[serde(rename = "memos-api-online")]
    MemosApiOnline,
    #[serde(rename = "memobase")]
    Memobase,
    #[serde(rename = "memu")]
    Memu,
    #[serde(rename = "supermemory")]
    Supermemory,
}

impl BackendKind {
    pub const ALL: [BackendKind; 7] = [
        BackendKind::Mem0,
        BackendKind::Mem0Graph,
        BackendKind::MemosApi,
        BackendKind::MemosApiOnline,
        BackendKind::Memobase,
        BackendKind::Memu,
        BackendKind::Supermemory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mem0 => "mem0",
            BackendKind::Mem0Graph => "mem0_graph",
            BackendKind::MemosApi => "memos-api",
            BackendKind::MemosApiOnline => "memos-api-online",
            BackendKind::Memobase => "memobase",
            BackendKind::Memu => "memu",
            BackendKind::Supermemory => "supermemory",
        }
    }

    /// Prefix for the `MEMBENCH_<KIND>_*` environment variables.
    pub fn env_prefix(&self) -> String {
        format!(
            "MEMBENCH_{}",
            self.as_str().to_ascii_uppercase().replace('-', "_")
        )
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendKindParseError {
    #[error("missing backend selector")]
    Missing,
    #[error("unsupported backend '{0}'. Supported backends: mem0, mem0_graph, memos-api, memos-api-online, memobase, memu, supermemory")]
    Unsupported(String),
}

impl FromStr for BackendKind {
    type Err = BackendKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(BackendKindParseError::Missing);
        }
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| BackendKindParseError::Unsupported(value.to_string()))
    }
}
