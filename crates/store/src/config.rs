use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default query endpoint base.
pub const DEFAULT_API_URL: &str = "https://api.cloudflare.com";

/// Fixed request timeout for store writes, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the D1 query endpoint.
///
/// Leaving `api_token` or `database_id` empty disables persistence: writes are
/// silently skipped rather than queued or failed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Cloudflare account id.
    pub account_id: String,

    /// D1 database id.
    pub database_id: String,

    /// API token with D1 write access.
    #[serde(serialize_with = "serialize_secret")]
    pub api_token: Secret<String>,

    /// Endpoint base. Only overridden in tests.
    pub api_url: String,

    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("account_id", &self.account_id)
            .field("database_id", &self.database_id)
            .field("api_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            database_id: String::new(),
            api_token: Secret::new(String::new()),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert!(cfg.account_id.is_empty());
    }

    #[test]
    fn debug_redacts_the_token() {
        let cfg = StoreConfig {
            api_token: Secret::new("super-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn deserialize_fills_defaults() {
        let cfg: StoreConfig = serde_json::from_str(
            r#"{"account_id": "acct", "database_id": "db", "api_token": "tok"}"#,
        )
        .unwrap();
        assert_eq!(cfg.account_id, "acct");
        assert_eq!(cfg.api_token.expose_secret(), "tok");
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
    }
}
