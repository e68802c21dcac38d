use membench_types::BackendKind;

use crate::ConfigError;

pub const REQUEST_TIMEOUT_ENV: &str = "MEMBENCH_REQUEST_TIMEOUT_MS";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Connection settings for one backend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Resolves `MEMBENCH_<KIND>_BASE_URL`, `MEMBENCH_<KIND>_API_KEY` and
    /// `MEMBENCH_REQUEST_TIMEOUT_MS` from the process environment.
    pub fn from_env(kind: BackendKind) -> Result<Self, ConfigError> {
        Self::from_lookup(kind, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(kind: BackendKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name).and_then(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };

        let prefix = kind.env_prefix();
        let base_url_var = format!("{prefix}_BASE_URL");
        let Some(base_url) = non_empty(&base_url_var) else {
            return Err(ConfigError::MissingBaseUrl {
                kind,
                variable: base_url_var,
            });
        };

        let request_timeout_ms = match non_empty(REQUEST_TIMEOUT_ENV) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    variable: REQUEST_TIMEOUT_ENV.to_string(),
                    reason: format!("expected a positive integer, got '{raw}'"),
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        Ok(Self {
            base_url,
            api_key: non_empty(&format!("{prefix}_API_KEY")),
            request_timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendConfig, DEFAULT_REQUEST_TIMEOUT_MS};
    use crate::ConfigError;
    use membench_types::BackendKind;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn resolves_kind_scoped_variables() {
        let config = BackendConfig::from_lookup(
            BackendKind::MemosApi,
            lookup(&[
                ("MEMBENCH_MEMOS_API_BASE_URL", " http://localhost:8001 "),
                ("MEMBENCH_MEMOS_API_API_KEY", "secret"),
                ("MEMBENCH_REQUEST_TIMEOUT_MS", "2500"),
            ]),
        )
        .expect("config should resolve");
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.request_timeout_ms, 2500);
    }

    #[test]
    fn missing_base_url_is_a_configuration_error() {
        let error = BackendConfig::from_lookup(
            BackendKind::Mem0,
            lookup(&[("MEMBENCH_MEM0_API_KEY", "k")]),
        )
        .expect_err("base url is required");
        assert!(matches!(
            error,
            ConfigError::MissingBaseUrl { ref variable, .. } if variable == "MEMBENCH_MEM0_BASE_URL"
        ));
    }

    #[test]
    fn invalid_timeout_is_rejected_and_blank_key_ignored() {
        let error = BackendConfig::from_lookup(
            BackendKind::Memu,
            lookup(&[
                ("MEMBENCH_MEMU_BASE_URL", "http://memu"),
                ("MEMBENCH_REQUEST_TIMEOUT_MS", "0"),
            ]),
        )
        .expect_err("zero timeout should fail");
        assert!(error.to_string().contains("MEMBENCH_REQUEST_TIMEOUT_MS"));

        let config = BackendConfig::from_lookup(
            BackendKind::Memu,
            lookup(&[
                ("MEMBENCH_MEMU_BASE_URL", "http://memu"),
                ("MEMBENCH_MEMU_API_KEY", "   "),
            ]),
        )
        .expect("config");
        assert_eq!(config.api_key, None);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }
}
