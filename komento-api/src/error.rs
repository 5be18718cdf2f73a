use crate::{CommentId, PostId, MAX_CONTENT_LEN};

/// Everything that can go wrong between the comment section and its store.
///
/// All of these are recoverable: they surface as inline view state at the
/// controller boundary and never terminate anything.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, thiserror::Error)]
pub enum Error {
    #[error("comment text is empty")]
    EmptyContent,

    #[error("comment text is {0} characters, over the {max} limit", max = MAX_CONTENT_LEN)]
    ContentTooLong(usize),

    #[error("permission denied")]
    PermissionDenied,

    #[error("could not resolve an actor identity: {0}")]
    IdentityUnavailable(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unknown comment {0:?}")]
    UnknownComment(CommentId),

    #[error("unknown post {0:?}")]
    UnknownPost(PostId),
}
