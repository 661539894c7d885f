use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Bot API base used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Caption recorded when neither a session title nor a message caption is set.
pub const DEFAULT_CAPTION_FALLBACK: &str = "MtcACG:TG";

/// Tag set recorded with every post.
pub const DEFAULT_TAGS: &str = "TG-forward";

/// Source tag recorded with every post.
pub const DEFAULT_SOURCE: &str = "TG-C";

/// Deadline for blob downloads, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Configuration for the forwarding bot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Publish target: a numeric chat id or an `@username`.
    pub channel_id: String,

    /// Sender ids/usernames allowed to drive the bot. Empty denies everyone.
    pub operators: Vec<String>,

    /// Caption fallback for posts without a title or caption.
    pub caption_fallback: String,

    /// Tag set written to each provenance record.
    pub tags: String,

    /// Source tag written to each provenance record.
    pub source: String,

    /// Bot API base override. Only set in tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Deadline for blob downloads, in seconds.
    pub fetch_timeout_secs: u64,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .field("operators", &self.operators)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            channel_id: String::new(),
            operators: Vec::new(),
            caption_fallback: DEFAULT_CAPTION_FALLBACK.to_string(),
            tags: DEFAULT_TAGS.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            api_url: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl BotConfig {
    /// Bot API base, honoring the test override.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}
