use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{ReactionKind, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// The raw record shape the store hands back. Everything the store does not
/// guarantee is optional here; komento-client normalizes this into its strict
/// `Comment` entity before anything else gets to see it.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentRecord {
    pub id: CommentId,

    /// None for a root comment. May reference a record that no longer exists.
    pub parent_id: Option<CommentId>,

    /// None for fully-anonymous legacy records; used for delete authorization
    pub author_id: Option<UserId>,

    pub author_name: Option<String>,
    pub author_avatar_url: Option<String>,

    pub content: String,

    /// None while the creating write still awaits its server timestamp
    pub created_at: Option<Time>,

    /// At most one entry per actor
    #[serde(default)]
    pub reactions: BTreeMap<UserId, ReactionKind>,
}

/// Fields of a comment creation, as submitted by the composer or a reply box.
/// Id, timestamp and the (empty) reaction map are assigned by the store.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar_url: String,
    pub content: String,
    pub parent_id: Option<CommentId>,
}
