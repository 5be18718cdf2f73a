use std::collections::BTreeMap;

use crate::api::{CommentId, CommentRecord, ReactionKind, Time, UserId};

/// Display attributes used when the author has none.
pub const DEFAULT_AUTHOR_NAME: &str = "Guest";
pub const DEFAULT_AVATAR_URL: &str = "https://via.placeholder.com/40";

/// A comment as the rest of the client sees it: the looseness of the raw
/// store record resolved into one strict shape.
///
/// Reply links (`children`) are never part of this entity; they are derived
/// by the thread builder on every snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub parent_id: Option<CommentId>,
    pub author_id: Option<UserId>,
    pub author_name: String,
    pub author_avatar_url: String,
    pub content: String,
    /// None while the creating write still awaits its server timestamp
    pub created_at: Option<Time>,
    pub reactions: BTreeMap<UserId, ReactionKind>,
}

impl Comment {
    /// Normalizes one raw record, or rejects it. A malformed record is a
    /// store-side anomaly we tolerate by dropping it here, at the adapter
    /// boundary, rather than letting it reach the thread builder.
    pub fn from_record(r: CommentRecord) -> Option<Comment> {
        if r.id.0.is_nil() {
            tracing::warn!("dropping comment record without a usable id");
            return None;
        }
        if r.content.trim().is_empty() {
            tracing::warn!(id = ?r.id, "dropping comment record with empty content");
            return None;
        }
        Some(Comment {
            id: r.id,
            parent_id: r.parent_id,
            author_id: r.author_id,
            author_name: r
                .author_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            author_avatar_url: r
                .author_avatar_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            content: r.content,
            created_at: r.created_at,
            reactions: r.reactions,
        })
    }

    pub fn is_authored_by(&self, actor: &UserId) -> bool {
        self.author_id.as_ref() == Some(actor)
    }
}
