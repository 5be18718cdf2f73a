use crate::UserId;

/// One of the fixed reaction categories a single actor may put on a comment.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Heart,
    Thumb,
    Lightbulb,
    Star,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Heart,
        ReactionKind::Thumb,
        ReactionKind::Lightbulb,
        ReactionKind::Star,
    ];
}

/// One actor's reaction toggle, applied by the store against its latest
/// state. Sending the toggle rather than a replacement map is what keeps two
/// actors reacting at the same time from overwriting each other.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReactionPatch {
    pub actor: UserId,
    pub kind: ReactionKind,
}
