//! Client configuration.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.aniapi.com";
pub const DEFAULT_VERSION: &str = "v1";

/// Where to send requests and how to authenticate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    /// First path segment, e.g. `v1`.
    pub version: String,
    /// JWT sent as `Authorization: Bearer`. Read-only endpoints work without one.
    pub token: Option<String>,
    /// Passed to the default transport. The client itself never times out.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            token: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.trim_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Defaults overridden by `ANIAPI_BASE_URL`, `ANIAPI_TOKEN` and
    /// `ANIAPI_TIMEOUT_SECS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(base_url) = lookup("ANIAPI_BASE_URL") {
            config = config.with_base_url(&base_url);
        }
        if let Some(token) = lookup("ANIAPI_TOKEN").filter(|t| !t.is_empty()) {
            config = config.with_token(token);
        }
        if let Some(secs) = lookup("ANIAPI_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    /// The bearer token, if one is configured and non-empty.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_public_api() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.aniapi.com");
        assert_eq!(config.version, "v1");
        assert_eq!(config.bearer(), None);
    }

    #[test]
    fn builder_normalizes_slashes() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:3000/")
            .with_version("/v2/");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.version, "v2");
    }

    #[test]
    fn empty_token_is_not_a_bearer() {
        let config = ClientConfig::default().with_token("");
        assert_eq!(config.bearer(), None);
    }

    #[test]
    fn env_lookup_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ANIAPI_BASE_URL", "http://127.0.0.1:9000/"),
            ("ANIAPI_TOKEN", "jwt"),
            ("ANIAPI_TIMEOUT_SECS", "not-a-number"),
        ]);
        let config = ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.bearer(), Some("jwt"));
        assert_eq!(config.timeout, None);
    }
}
