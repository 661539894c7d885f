//! Inbound message routing: operator access check, command dispatch, media
//! capture, and session classification prompts.

use {
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{MediaKind, MessageKind, ReplyParameters},
    },
    tracing::{debug, info, warn},
};

use crate::{
    access, publish,
    session::{CapturedMessage, Classified, MediaPayload, PhotoRendition, SessionError},
    state::AppState,
};

const SESSION_OPENED_MSG: &str =
    "Forwarding session opened.\nSend the preview image or the original file.";
const PREVIEW_CAPTURED_MSG: &str =
    "Preview captured.\nSend the original file next, or /forward_end to publish.";
const ORIGINAL_CAPTURED_MSG: &str = "Original captured.\nSend /forward_end to publish.";
const PROCESSING_SINGLE_FILE_MSG: &str = "Processing single file submission...";
const SAVE_ACK_MSG: &str = "Database synced (realtime mode).";

/// Handle one inbound message (called from the polling loop, in delivery
/// order).
pub async fn handle_message(state: &AppState, msg: Message) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without a sender");
        return Ok(());
    };
    let peer_id = from.id.0.to_string();
    let username = from.username.clone();

    if let Err(reason) =
        access::check_operator(&state.config.operators, &peer_id, username.as_deref())
    {
        debug!(%reason, peer_id, "dropping message");
        return Ok(());
    }

    if let Some(command) = extract_text(&msg).as_deref().and_then(parse_command) {
        handle_command(state, &msg, command).await;
        return Ok(());
    }

    if let Some(captured) = capture_media(&msg) {
        handle_media(state, &msg, captured).await;
        return Ok(());
    }

    debug!(message_id = msg.id.0, "ignoring non-candidate message");
    Ok(())
}

/// Operator commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    ForwardStart { title: Option<String> },
    ForwardEnd,
    Save,
}

async fn handle_command(state: &AppState, msg: &Message, command: Command) {
    match command {
        Command::ForwardStart { title } => {
            {
                let mut session = state.session.lock().await;
                session.start(title);
            }
            info!(chat_id = msg.chat.id.0, "forwarding session opened");
            reply(state, msg, SESSION_OPENED_MSG).await;
        },
        Command::ForwardEnd => finalize_session(state, msg).await,
        Command::Save => reply(state, msg, SAVE_ACK_MSG).await,
    }
}

/// Close the session and run the publish/persist pipeline.
async fn finalize_session(state: &AppState, msg: &Message) {
    // Session contents move out under the lock; publish and synthesis run
    // after release. The session is reset whether or not publication succeeds.
    let input = {
        let mut session = state.session.lock().await;
        session.finalize()
    };

    let input = match input {
        Ok(input) => input,
        Err(e @ (SessionError::NoSessionOpen | SessionError::NoArtifactCaptured)) => {
            reply(state, msg, &e.to_string()).await;
            return;
        },
    };

    if input.preview.media.is_file() {
        reply(state, msg, PROCESSING_SINGLE_FILE_MSG).await;
    }

    match publish::publish_pair(state, input).await {
        Ok(outcome) if outcome.published => {
            reply(state, msg, &format!("Published {}.", outcome.post_id)).await;
        },
        Ok(outcome) => {
            reply(
                state,
                msg,
                &format!(
                    "Recorded {} without a channel post (preview derivation failed).",
                    outcome.post_id
                ),
            )
            .await;
        },
        Err(crate::Error::Store(e)) => {
            // The channel post (if any) is not rolled back.
            reply(state, msg, &format!("Record store write failed: {e}")).await;
        },
        Err(e) => {
            reply(state, msg, &format!("Publish failed: {e}")).await;
        },
    }
}

async fn handle_media(state: &AppState, msg: &Message, captured: CapturedMessage) {
    let mut session = state.session.lock().await;
    if session.is_open() {
        let verdict = session.classify(captured);
        drop(session);
        match verdict {
            Classified::PreviewCaptured => {
                info!(message_id = msg.id.0, "preview captured");
                reply(state, msg, PREVIEW_CAPTURED_MSG).await;
            },
            Classified::OriginalCaptured => {
                info!(message_id = msg.id.0, "original captured");
                reply(state, msg, ORIGINAL_CAPTURED_MSG).await;
            },
            Classified::Ignored => {
                debug!(message_id = msg.id.0, "no role left for message");
            },
        }
        return;
    }
    drop(session);

    // No session open: photos take the legacy single-shot path.
    if matches!(captured.media, MediaPayload::Photo(_)) {
        match publish::publish_single_shot(state, &captured).await {
            Ok(outcome) => {
                reply(state, msg, &format!("Saved {} (legacy mode).", outcome.post_id)).await;
            },
            Err(e) => {
                warn!(error = %e, "legacy single-shot publish failed");
                reply(state, msg, &format!("Save failed: {e}")).await;
            },
        }
    }
}

async fn reply(state: &AppState, msg: &Message, text: &str) {
    let request = state
        .bot
        .send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id));
    if let Err(e) = request.await {
        warn!(chat_id = msg.chat.id.0, error = %e, "failed to send operator reply");
    }
}

/// Extract the text or caption from a message.
pub(crate) fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            MediaKind::Photo(p) => p.caption.clone(),
            MediaKind::Document(d) => d.caption.clone(),
            _ => None,
        },
        _ => None,
    }
}

/// Project a message onto the session's artifact model. Photos and documents
/// are candidates; everything else is not.
pub(crate) fn capture_media(msg: &Message) -> Option<CapturedMessage> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };

    let media = match &common.media_kind {
        MediaKind::Photo(p) => MediaPayload::Photo(
            p.photo
                .iter()
                .map(|ps| PhotoRendition {
                    file_id: ps.file.id.clone(),
                    width: ps.width,
                    height: ps.height,
                })
                .collect(),
        ),
        MediaKind::Document(d) => MediaPayload::File {
            file_id: d.document.file.id.clone(),
        },
        _ => return None,
    };

    Some(CapturedMessage {
        id: i64::from(msg.id.0),
        chat_id: msg.chat.id.0,
        caption: extract_text(msg),
        media,
    })
}

/// Parse an operator command, tolerating an `@botname` suffix on the command
/// word. Unknown slash commands return `None` and fall through to the media
/// path (where they are ignored as non-candidates).
pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let head = parts.next()?;
    let head = head.split('@').next().unwrap_or(head);
    let rest = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    match head {
        "/forward_start" => Some(Command::ForwardStart { title: rest }),
        "/forward_end" => Some(Command::ForwardEnd),
        "/save" => Some(Command::Save),
        _ => None,
    }
}
