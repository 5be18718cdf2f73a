mod comment;
mod error;
mod post;
mod reaction;
mod store;
mod user;

pub use comment::{CommentId, CommentRecord, NewComment};
pub use error::Error;
pub use post::PostId;
pub use reaction::{ReactionKind, ReactionPatch};
pub use store::{FeedMessage, Store};
pub use user::{Identity, UserId};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Maximum comment length in characters, checked at composition time.
pub const MAX_CONTENT_LEN: usize = 500;

/// Checks comment text before any store call is made. The stored content is
/// the trimmed text, so both checks run on the trimmed form.
pub fn validate_content(text: &str) -> Result<(), Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyContent);
    }
    let len = trimmed.chars().count();
    if len > MAX_CONTENT_LEN {
        return Err(Error::ContentTooLong(len));
    }
    Ok(())
}
