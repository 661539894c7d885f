/// Provenance metadata for one published post.
///
/// Immutable once written; the store exposes no update or delete. The
/// `created_at` column is stamped by the client at persist time and is not
/// part of this struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Deterministic id derived from the triggering message, `manual_<id>`.
    pub post_id: String,
    /// Transport reference of the published preview rendition.
    pub preview_ref: String,
    /// Transport reference of the original file; empty when no distinct
    /// original exists.
    pub origin_ref: String,
    pub caption: String,
    pub tags: String,
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Derive the post id for a manually forwarded message.
#[must_use]
pub fn manual_post_id(message_id: i64) -> String {
    format!("manual_{message_id}")
}
