use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use membench_types::MemoryRecord;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::{BackendConfig, BackendError, ConfigError};

pub(crate) const REQUEST_ID_HEADER: &str = "x-membench-request-id";

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

fn new_request_id() -> String {
    let count = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("membench-{}-{count}", membench_core::current_unix_timestamp())
}

/// How the api key is presented to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `Authorization: Token <key>`
    Token,
}

/// JSON-over-HTTP plumbing shared by every adapter.
#[derive(Debug, Clone)]
pub(crate) struct JsonTransport {
    client: reqwest::Client,
    base_url: String,
}

impl JsonTransport {
    pub(crate) fn new(config: &BackendConfig, auth: AuthScheme) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = config.api_key.as_deref().map(str::trim) {
            let value = match auth {
                AuthScheme::Bearer => format!("Bearer {api_key}"),
                AuthScheme::Token => format!("Token {api_key}"),
            };
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value).map_err(|error| ConfigError::InvalidValue {
                    variable: "api key".to_string(),
                    reason: error.to_string(),
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` and decodes the JSON reply. An empty reply decodes as `null`.
    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let url = self.url(path);
        let request_id = new_request_id();
        debug!(%url, %request_id, "backend request");

        let response = self
            .client
            .post(&url)
            .header(REQUEST_ID_HEADER, request_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }
        if raw.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Returns `value["data"]` when the service wraps its payload, else `value`.
pub(crate) fn unwrap_data(value: &Value) -> &Value {
    match value.get("data") {
        Some(data) if data.is_object() || data.is_array() => data,
        _ => value,
    }
}

/// Normalizes a JSON array of memories into uniform records.
pub(crate) fn records_from_array(
    value: Option<&Value>,
    what: &str,
) -> Result<Vec<MemoryRecord>, BackendError> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Err(BackendError::InvalidResponse(format!(
            "response is missing array '{what}'"
        )));
    };
    items
        .iter()
        .cloned()
        .map(|item| {
            MemoryRecord::from_value(item)
                .map_err(|error| BackendError::InvalidResponse(format!("{what}: {error}")))
        })
        .collect()
}

/// Truncates to `max_chars` characters, never splitting a code point.
pub(crate) fn truncate_chars(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => content[..byte_index].to_string(),
        None => content.to_string(),
    }
}
