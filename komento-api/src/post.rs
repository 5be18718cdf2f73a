/// Slug of the blog post owning a discussion. Partitions every query: a
/// subscription, create, update or delete never crosses post boundaries.
#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(slug: impl Into<String>) -> PostId {
        PostId(slug.into())
    }
}
