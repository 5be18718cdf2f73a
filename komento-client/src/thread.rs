use std::collections::{HashMap, HashSet};

use crate::api::CommentId;
use crate::Comment;

/// One comment with its direct replies, recursively.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CommentNode::subtree_len)
            .sum::<usize>()
    }
}

/// Reassembles a flat comment list into its forest of reply trees.
///
/// The tree shape depends only on id/parent linkage, so input order is free
/// to vary; sibling order is whatever order the input had (the store delivers
/// creation time ascending, which makes sibling order deterministic). Linear:
/// one grouping pass, then each comment is moved onto its parent exactly once.
///
/// A comment whose parent is not in the set ends up in no tree at all, along
/// with its own descendants: not promoted to root, not an error.
pub fn build(comments: Vec<Comment>) -> Vec<CommentNode> {
    let known: HashSet<CommentId> = comments.iter().map(|c| c.id).collect();
    let mut children_of: HashMap<CommentId, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();
    for c in comments {
        match c.parent_id {
            None => roots.push(c),
            Some(p) if known.contains(&p) => children_of.entry(p).or_default().push(c),
            Some(p) => {
                tracing::warn!(id = ?c.id, parent = ?p, "comment references a parent missing from the snapshot; leaving it unreachable");
            }
        }
    }
    roots
        .into_iter()
        .map(|c| attach(c, &mut children_of))
        .collect()
    // groups whose key never got visited belonged to unreachable subtrees and
    // are dropped with the map
}

fn attach(comment: Comment, children_of: &mut HashMap<CommentId, Vec<Comment>>) -> CommentNode {
    let children = children_of
        .remove(&comment.id)
        .map(|group| group.into_iter().map(|c| attach(c, children_of)).collect())
        .unwrap_or_default();
    CommentNode { comment, children }
}
