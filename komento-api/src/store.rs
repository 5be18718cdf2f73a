use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{CommentId, CommentRecord, Error, Identity, NewComment, PostId, ReactionPatch, UserId};

/// One message pushed on a live comment feed.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    /// The full current result set, ordered by creation time ascending. Sent
    /// once right after subscribing and then again on every change to the
    /// post's comments.
    Snapshot(Vec<CommentRecord>),

    /// The feed is over; nothing follows and the channel closes. Getting live
    /// again takes an explicit re-subscribe.
    Terminated(Error),
}

/// The realtime document store backing the comments of one blog.
///
/// The store owns the data: clients never treat their local copy as
/// authoritative, every mutation goes through here and the UI reflects only
/// what comes back on a feed.
#[async_trait]
pub trait Store {
    /// Returns the stable actor identity of this client, creating an
    /// anonymous one on first call. Idempotent: repeated calls while already
    /// identified return the same identity without side effects.
    async fn resolve_identity(&self) -> Result<Identity, Error>;

    /// Registers a live query for the comments under `post`. Dropping the
    /// receiver is the cancellation path.
    async fn subscribe(&self, post: &PostId)
        -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error>;

    /// Creates one comment. The store assigns the id, the (monotonic within a
    /// post) creation timestamp, and the initial empty reaction map.
    async fn create(&self, post: &PostId, comment: NewComment) -> Result<CommentId, Error>;

    /// Applies a reaction toggle against the store's latest state, atomically
    /// with respect to other updates. Touches nothing but the reaction map.
    async fn update(
        &self,
        post: &PostId,
        comment: CommentId,
        patch: ReactionPatch,
    ) -> Result<(), Error>;

    /// Removes exactly one record, after checking that `actor` authored it.
    /// Children are left in place; nothing cascades.
    async fn delete(&self, post: &PostId, comment: CommentId, actor: UserId) -> Result<(), Error>;
}
