mod comment;
pub use comment::{Comment, DEFAULT_AUTHOR_NAME, DEFAULT_AVATAR_URL};

pub mod reactions;

mod section;
pub use section::{CommentSection, FeedState};

mod thread;
pub use thread::{build, CommentNode};

pub mod api {
    pub use komento_api::*;
}
