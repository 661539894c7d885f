use {teloxide::Bot, tokio::sync::Mutex};

use {mediarelay_media::PreviewPolicy, mediarelay_store::D1Client};

use crate::{config::BotConfig, session::ForwardSession};

/// Process-wide runtime state shared by the polling loop and handlers.
pub struct AppState {
    pub bot: Bot,
    pub config: BotConfig,
    pub policy: PreviewPolicy,
    pub store: D1Client,
    /// Client for blob downloads; constructed with the configured fetch
    /// deadline so every download inherits it.
    pub http: reqwest::Client,
    /// The single forwarding session. Start/Classify/Finalize all go through
    /// this mutex, so role assignment stays linearizable with arrival order.
    /// Never held across publish/persist awaits; finalize moves the contents
    /// out first.
    pub session: Mutex<ForwardSession>,
}
