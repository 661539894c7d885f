//! Publication coordinator.
//!
//! On finalize, resolves the caption and artifact roles, derives preview bytes
//! when the preview role was satisfied by a raw file, publishes to the target
//! channel, and persists the provenance record. At most one publish call and
//! one persist call per invocation.

use {
    secrecy::ExposeSecret,
    teloxide::{
        payloads::SendPhotoSetters,
        prelude::*,
        types::{InputFile, Recipient},
    },
    tracing::{info, warn},
};

use {
    mediarelay_media::{fetch, synthesize_preview},
    mediarelay_store::{ImageRecord, SaveOutcome, manual_post_id},
};

use crate::{
    config::BotConfig,
    error::{Error, Result},
    session::{CapturedMessage, FinalizeInput, MediaPayload},
    state::AppState,
};

/// What one publish-and-persist cycle did, for operator feedback.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub post_id: String,
    /// False when the degraded single-file path skipped the channel post.
    pub published: bool,
    pub store: SaveOutcome,
}

struct ResolvedRoles {
    preview_ref: String,
    origin_ref: String,
    width: u32,
    height: u32,
    published: bool,
}

/// Publish a finalized session: preview (+ optional original reference) to the
/// channel, provenance to the store.
///
/// Photo previews are republished by reference; file previews are downloaded,
/// synthesized into a bounded JPEG, and uploaded. A failure anywhere in the
/// file path degrades to recording the raw file reference without a channel
/// post. A store failure is returned after the publish and is not rolled back.
pub async fn publish_pair(state: &AppState, input: FinalizeInput) -> Result<PublishOutcome> {
    let caption = resolve_caption(
        input.title.as_deref(),
        input.preview.caption.as_deref(),
        &state.config.caption_fallback,
    );
    let post_id = manual_post_id(input.preview.id);

    let roles = match &input.preview.media {
        MediaPayload::Photo(renditions) => {
            let largest = renditions
                .last()
                .ok_or_else(|| Error::message("photo message carried no renditions"))?;
            let preview_ref = republish_rendition(state, &largest.file_id, &caption).await?;
            let origin_ref = match &input.original {
                Some(CapturedMessage {
                    media: MediaPayload::File { file_id },
                    ..
                }) => file_id.clone(),
                _ => String::new(),
            };
            ResolvedRoles {
                preview_ref,
                origin_ref,
                width: largest.width,
                height: largest.height,
                published: true,
            }
        },
        MediaPayload::File { file_id } => match derive_and_publish(state, file_id, &caption).await
        {
            Ok((preview_ref, width, height)) => ResolvedRoles {
                preview_ref,
                origin_ref: file_id.clone(),
                width,
                height,
                published: true,
            },
            Err(e) => {
                warn!(error = %e, "preview derivation failed, recording raw file reference");
                ResolvedRoles {
                    preview_ref: file_id.clone(),
                    origin_ref: file_id.clone(),
                    width: 0,
                    height: 0,
                    published: false,
                }
            },
        },
    };

    let record = ImageRecord {
        post_id: post_id.clone(),
        preview_ref: roles.preview_ref,
        origin_ref: roles.origin_ref,
        caption,
        tags: state.config.tags.clone(),
        source: state.config.source.clone(),
        width: roles.width,
        height: roles.height,
    };
    let store = state.store.save_image(&record).await?;

    info!(
        post_id = %record.post_id,
        published = roles.published,
        store = ?store,
        "forward finalized"
    );
    Ok(PublishOutcome {
        post_id,
        published: roles.published,
        store,
    })
}

/// Legacy single-shot path: republish an operator photo immediately, outside
/// any session.
pub async fn publish_single_shot(
    state: &AppState,
    message: &CapturedMessage,
) -> Result<PublishOutcome> {
    let MediaPayload::Photo(renditions) = &message.media else {
        return Err(Error::message("single-shot publish requires a photo"));
    };
    let largest = renditions
        .last()
        .ok_or_else(|| Error::message("photo message carried no renditions"))?;

    let caption = resolve_caption(None, message.caption.as_deref(), &state.config.caption_fallback);
    let preview_ref = republish_rendition(state, &largest.file_id, &caption).await?;

    let post_id = manual_post_id(message.id);
    let record = ImageRecord {
        post_id: post_id.clone(),
        preview_ref,
        origin_ref: String::new(),
        caption,
        tags: state.config.tags.clone(),
        source: state.config.source.clone(),
        width: largest.width,
        height: largest.height,
    };
    let store = state.store.save_image(&record).await?;

    Ok(PublishOutcome {
        post_id,
        published: true,
        store,
    })
}

/// Re-send an existing photo rendition to the channel by reference. Returns
/// the transport reference of the published copy.
async fn republish_rendition(state: &AppState, file_id: &str, caption: &str) -> Result<String> {
    let published = state
        .bot
        .send_photo(channel_recipient(&state.config), InputFile::file_id(file_id))
        .caption(caption.to_string())
        .await?;

    Ok(largest_photo_ref(&published).unwrap_or_else(|| file_id.to_string()))
}

/// Single-file path: fetch the raw bytes, synthesize a displayable rendition,
/// and upload it. Returns the published reference and recorded dimensions.
async fn derive_and_publish(
    state: &AppState,
    file_id: &str,
    caption: &str,
) -> Result<(String, u32, u32)> {
    let file = state.bot.get_file(file_id.to_string()).await?;
    let raw = fetch::fetch_file(
        &state.http,
        state.config.api_base(),
        state.config.token.expose_secret(),
        &file.path,
    )
    .await?;

    let policy = state.policy.clone();
    let preview = tokio::task::spawn_blocking(move || synthesize_preview(&raw, &policy))
        .await
        .map_err(|e| Error::message(format!("synthesis task failed: {e}")))??;

    let upload = InputFile::memory(preview.data).file_name("preview.jpg");
    let published = state
        .bot
        .send_photo(channel_recipient(&state.config), upload)
        .caption(caption.to_string())
        .await?;

    match published.photo().and_then(<[_]>::last) {
        Some(ps) => Ok((ps.file.id.clone(), ps.width, ps.height)),
        // The upload was accepted but the response carried no rendition; treat
        // it like a failed derivation so the raw reference gets recorded.
        None => Err(Error::message("publish response carried no photo")),
    }
}

/// First non-empty of: session title, preview caption, configured fallback.
fn resolve_caption(title: Option<&str>, message_caption: Option<&str>, fallback: &str) -> String {
    for candidate in [title, message_caption] {
        if let Some(text) = candidate {
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }
    fallback.to_string()
}

/// The publish target accepts either a numeric chat id or an `@username`.
fn channel_recipient(config: &BotConfig) -> Recipient {
    match config.channel_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(config.channel_id.clone()),
    }
}

fn largest_photo_ref(message: &Message) -> Option<String> {
    message
        .photo()
        .and_then(<[_]>::last)
        .map(|ps| ps.file.id.clone())
}
