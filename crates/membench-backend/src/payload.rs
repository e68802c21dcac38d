use membench_types::Turn;
use serde_json::{json, Value};

use crate::http::truncate_chars;

/// Per-turn character cap for services that reject oversized messages.
pub const MAX_TURN_CHARS: usize = 8000;

/// `[{"role", "content"}]` exactly as loaded.
pub(crate) fn plain_messages(turns: &[Turn]) -> Value {
    Value::Array(
        turns
            .iter()
            .map(|turn| json!({"role": turn.role.as_str(), "content": turn.content}))
            .collect(),
    )
}

/// `[{"role", "content", "chat_time"}]` with content capped at [`MAX_TURN_CHARS`].
pub(crate) fn timestamped_messages(turns: &[Turn], chat_time: &str) -> Value {
    Value::Array(
        turns
            .iter()
            .map(|turn| {
                json!({
                    "role": turn.role.as_str(),
                    "content": truncate_chars(&turn.content, MAX_TURN_CHARS),
                    "chat_time": chat_time,
                })
            })
            .collect(),
    )
}
