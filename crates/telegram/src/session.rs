//! Forwarding session state machine.
//!
//! A session pairs up to two operator-submitted artifacts: a preview (photo or
//! file, whichever arrives first) and an optional original (always a file,
//! never the preview itself). Exactly one session exists per process; the
//! owner serializes all access through `state::AppState::session` so role
//! assignment is linearizable with message arrival order.

use thiserror::Error;

/// Transport-independent projection of an inbound media message.
///
/// Built by `handlers::capture_media`; messages carrying neither a photo nor a
/// file never become a `CapturedMessage` and so never enter the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    pub id: i64,
    pub chat_id: i64,
    pub caption: Option<String>,
    pub media: MediaPayload,
}

/// The two candidate artifact kinds, as a tagged variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    /// Rendition list in transport order; the largest rendition is last.
    Photo(Vec<PhotoRendition>),
    /// A single untyped file.
    File { file_id: String },
}

impl MediaPayload {
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// One size variant of a photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRendition {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

/// Role assigned to an inbound artifact by [`ForwardSession::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// The message became the session's preview.
    PreviewCaptured,
    /// The message became the session's original.
    OriginalCaptured,
    /// No role left for this message (session closed, both roles filled, or
    /// the message does not qualify for the remaining role).
    Ignored,
}

/// Operator-sequencing errors, rendered as chat text.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no forwarding session is open")]
    NoSessionOpen,
    #[error("no photo or file was captured")]
    NoArtifactCaptured,
}

/// Session contents handed to the publication coordinator on finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeInput {
    pub title: Option<String>,
    pub preview: CapturedMessage,
    pub original: Option<CapturedMessage>,
}

/// The single in-memory record of an in-progress forward-and-publish
/// operation.
///
/// Invariant: `original` is only ever set while `preview` is set, holds a
/// `File` payload, and refers to a different message than the preview.
#[derive(Debug, Default)]
pub struct ForwardSession {
    open: bool,
    title: Option<String>,
    preview: Option<CapturedMessage>,
    original: Option<CapturedMessage>,
}

impl ForwardSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open a session, silently discarding any unfinished one.
    pub fn start(&mut self, title: Option<String>) {
        self.open = true;
        self.title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.preview = None;
        self.original = None;
    }

    /// Assign a role to an inbound artifact.
    ///
    /// Roles are strictly FIFO: whichever qualifying message arrives first is
    /// the preview, regardless of payload kind. A later file-kind message
    /// distinct from the preview becomes the original. Everything else is
    /// ignored.
    pub fn classify(&mut self, message: CapturedMessage) -> Classified {
        if !self.open {
            return Classified::Ignored;
        }

        if self.preview.is_none() {
            self.preview = Some(message);
            return Classified::PreviewCaptured;
        }

        let preview_id = self.preview.as_ref().map(|p| p.id);
        if self.original.is_none()
            && message.media.is_file()
            && preview_id != Some(message.id)
        {
            self.original = Some(message);
            return Classified::OriginalCaptured;
        }

        Classified::Ignored
    }

    /// Close the session and hand its contents to the caller.
    ///
    /// Fails with [`SessionError::NoSessionOpen`] when closed (state
    /// untouched) and [`SessionError::NoArtifactCaptured`] when nothing was
    /// classified; in the latter case the session is still reset. Every
    /// non-`NoSessionOpen` path leaves the session empty and closed.
    pub fn finalize(&mut self) -> Result<FinalizeInput, SessionError> {
        if !self.open {
            return Err(SessionError::NoSessionOpen);
        }

        self.open = false;
        let title = self.title.take();
        let preview = self.preview.take();
        let original = self.original.take();

        match preview {
            Some(preview) => Ok(FinalizeInput {
                title,
                preview,
                original,
            }),
            None => Err(SessionError::NoArtifactCaptured),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: i64) -> CapturedMessage {
        CapturedMessage {
            id,
            chat_id: 42,
            caption: None,
            media: MediaPayload::Photo(vec![
                PhotoRendition {
                    file_id: format!("photo-{id}-small"),
                    width: 320,
                    height: 240,
                },
                PhotoRendition {
                    file_id: format!("photo-{id}-large"),
                    width: 1280,
                    height: 960,
                },
            ]),
        }
    }

    fn file(id: i64) -> CapturedMessage {
        CapturedMessage {
            id,
            chat_id: 42,
            caption: None,
            media: MediaPayload::File {
                file_id: format!("doc-{id}"),
            },
        }
    }

    #[test]
    fn closed_session_ignores_everything() {
        let mut session = ForwardSession::new();
        assert_eq!(session.classify(photo(1)), Classified::Ignored);
        assert_eq!(session.finalize(), Err(SessionError::NoSessionOpen));
    }

    #[test]
    fn first_qualifying_message_becomes_preview_photo_then_file() {
        let mut session = ForwardSession::new();
        session.start(Some("Cats".into()));
        assert_eq!(session.classify(photo(1)), Classified::PreviewCaptured);
        assert_eq!(session.classify(file(2)), Classified::OriginalCaptured);

        let input = session.finalize().expect("finalize");
        assert_eq!(input.title.as_deref(), Some("Cats"));
        assert_eq!(input.preview.id, 1);
        assert_eq!(input.original.expect("original").id, 2);
    }

    #[test]
    fn file_arriving_first_becomes_the_preview() {
        let mut session = ForwardSession::new();
        session.start(None);
        // FIFO: a file can be the preview; a later photo never displaces it.
        assert_eq!(session.classify(file(1)), Classified::PreviewCaptured);
        assert_eq!(session.classify(photo(2)), Classified::Ignored);

        let input = session.finalize().expect("finalize");
        assert!(input.preview.media.is_file());
        assert!(input.original.is_none());
    }

    #[test]
    fn two_files_fill_both_roles() {
        let mut session = ForwardSession::new();
        session.start(None);
        assert_eq!(session.classify(file(1)), Classified::PreviewCaptured);
        assert_eq!(session.classify(file(2)), Classified::OriginalCaptured);
    }

    #[test]
    fn third_qualifying_message_is_ignored() {
        let mut session = ForwardSession::new();
        session.start(None);
        session.classify(photo(1));
        session.classify(file(2));
        assert_eq!(session.classify(file(3)), Classified::Ignored);
        assert_eq!(session.classify(photo(4)), Classified::Ignored);

        let input = session.finalize().expect("finalize");
        assert_eq!(input.preview.id, 1);
        assert_eq!(input.original.expect("original").id, 2);
    }

    #[test]
    fn the_preview_message_cannot_double_as_the_original() {
        let mut session = ForwardSession::new();
        session.start(None);
        assert_eq!(session.classify(file(7)), Classified::PreviewCaptured);
        // Same message id re-delivered: must not fill the original slot.
        assert_eq!(session.classify(file(7)), Classified::Ignored);
    }

    #[test]
    fn a_photo_never_becomes_the_original() {
        let mut session = ForwardSession::new();
        session.start(None);
        session.classify(photo(1));
        assert_eq!(session.classify(photo(2)), Classified::Ignored);
    }

    #[test]
    fn start_always_clears_prior_state() {
        let mut session = ForwardSession::new();
        session.start(Some("first".into()));
        session.classify(photo(1));
        session.classify(file(2));

        session.start(Some("second".into()));
        assert!(session.is_open());
        let err = session.finalize().expect_err("no artifacts after restart");
        assert_eq!(err, SessionError::NoArtifactCaptured);
    }

    #[test]
    fn blank_title_is_treated_as_absent() {
        let mut session = ForwardSession::new();
        session.start(Some("   ".into()));
        session.classify(photo(1));
        let input = session.finalize().expect("finalize");
        assert_eq!(input.title, None);
    }

    #[test]
    fn finalize_without_artifacts_resets_the_session() {
        let mut session = ForwardSession::new();
        session.start(None);
        assert_eq!(session.finalize(), Err(SessionError::NoArtifactCaptured));
        // The failure path still closed the session.
        assert!(!session.is_open());
        assert_eq!(session.finalize(), Err(SessionError::NoSessionOpen));
    }

    #[test]
    fn finalize_resets_even_on_success() {
        let mut session = ForwardSession::new();
        session.start(Some("Cats".into()));
        session.classify(photo(1));
        session.finalize().expect("finalize");

        assert!(!session.is_open());
        assert_eq!(session.classify(photo(2)), Classified::Ignored);
    }
}
