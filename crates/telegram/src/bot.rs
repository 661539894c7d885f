use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {mediarelay_media::PreviewPolicy, mediarelay_store::D1Client};

use crate::{config::BotConfig, handlers, session::ForwardSession, state::AppState};

/// Start polling for updates.
///
/// Spawns a background task that processes updates sequentially (so session
/// classification follows delivery order) until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    config: BotConfig,
    policy: PreviewPolicy,
    store: D1Client,
) -> anyhow::Result<CancellationToken> {
    // Client timeout above the long-polling timeout (30s) so the HTTP client
    // doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let mut bot = Bot::with_client(config.token.expose_secret(), client);
    if let Some(api_url) = &config.api_url {
        bot = bot.set_api_url(api_url.parse()?);
    }

    // Verify credentials.
    let me = bot.get_me().await?;
    info!(username = ?me.username, "telegram bot connected");

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("forward_start", "Open a forwarding session (optional title)"),
        BotCommand::new("forward_end", "Publish the captured pair"),
        BotCommand::new("save", "Acknowledge realtime store sync"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    let cancel = CancellationToken::new();
    let state = Arc::new(AppState {
        bot: bot.clone(),
        config,
        policy,
        store,
        http,
        session: tokio::sync::Mutex::new(ForwardSession::new()),
    });

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                // Awaited inline: one message at a time, in
                                // delivery order.
                                if let Err(e) = handlers::handle_message(&state, msg).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance polling with the same token wins.
                    let is_conflict =
                        matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates));
                    if is_conflict {
                        warn!(
                            "telegram bot stopped: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}
