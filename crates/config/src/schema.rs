use serde::{Deserialize, Serialize};

use {
    mediarelay_media::PreviewPolicy, mediarelay_store::StoreConfig, mediarelay_telegram::BotConfig,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub telegram: BotConfig,
    pub store: StoreConfig,
    pub preview: PreviewPolicy,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, super::*};

    #[test]
    fn default_config_has_no_credentials() {
        let cfg = RelayConfig::default();
        assert!(cfg.telegram.token.expose_secret().is_empty());
        assert!(cfg.store.api_token.expose_secret().is_empty());
        assert_eq!(cfg.preview.max_dimension, 9_500);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: RelayConfig = toml::from_str(
            r#"
            [telegram]
            token = "123:ABC"
            channel_id = "@artchannel"

            [preview]
            target_bytes = 500000
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.preview.target_bytes, 500_000);
        // untouched sections keep their defaults
        assert_eq!(cfg.preview.quality_floor, 40);
        assert_eq!(cfg.store.request_timeout_secs, 10);
    }
}
