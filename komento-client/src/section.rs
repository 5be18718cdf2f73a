use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::{
    api::{
        validate_content, CommentId, CommentRecord, Error, FeedMessage, Identity, NewComment,
        PostId, ReactionKind, ReactionPatch, Store, MAX_CONTENT_LEN,
    },
    comment::{DEFAULT_AUTHOR_NAME, DEFAULT_AVATAR_URL},
    thread, Comment, CommentNode,
};

/// Where the live query of a section currently stands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FeedState {
    Unsubscribed,
    /// Subscribed, first snapshot not yet received.
    Subscribing,
    Live,
    /// The feed ended on its own. Comments stay on screen but are stale;
    /// getting live again takes an explicit [`CommentSection::resubscribe`].
    Lost(Error),
}

/// Owns the comment feed of one blog post and every piece of UI-facing state
/// around it: the rebuilt reply forest, the composer, the open reply boxes,
/// and the lazily-resolved actor identity.
///
/// All store traffic of the comment section funnels through here; failures
/// come back as [`Error`] values for inline display and never unwind further.
pub struct CommentSection<S> {
    store: S,
    post: Option<PostId>,
    state: FeedState,
    feed: Option<mpsc::UnboundedReceiver<FeedMessage>>,
    identity: Option<Identity>,
    comments: Vec<Comment>,
    roots: Vec<CommentNode>,
    composer: String,
    reply_boxes: HashMap<CommentId, String>,
}

impl<S: Store> CommentSection<S> {
    pub fn new(store: S) -> CommentSection<S> {
        CommentSection {
            store,
            post: None,
            state: FeedState::Unsubscribed,
            feed: None,
            identity: None,
            comments: Vec::new(),
            roots: Vec::new(),
            composer: String::new(),
            reply_boxes: HashMap::new(),
        }
    }

    /// Points the section at `post`. Any previous subscription is dropped
    /// before the new one is established, so a snapshot from the old post can
    /// never land in the new view.
    pub async fn subscribe(&mut self, post: PostId) -> Result<(), Error> {
        self.unsubscribe();
        self.post = Some(post.clone());
        self.state = FeedState::Subscribing;
        match self.store.subscribe(&post).await {
            Ok(feed) => {
                self.feed = Some(feed);
                Ok(())
            }
            Err(e) => {
                self.state = FeedState::Lost(e.clone());
                Err(e)
            }
        }
    }

    /// Drops the live query and everything derived from it. The store prunes
    /// the dead watcher on its next broadcast.
    pub fn unsubscribe(&mut self) {
        self.feed = None;
        self.post = None;
        self.state = FeedState::Unsubscribed;
        self.comments.clear();
        self.roots.clear();
        self.composer.clear();
        self.reply_boxes.clear();
    }

    /// Manual retry after the feed was lost.
    pub async fn resubscribe(&mut self) -> Result<(), Error> {
        match self.post.clone() {
            Some(post) => self.subscribe(post).await,
            None => Err(Error::Unavailable("not subscribed to a post".to_string())),
        }
    }

    /// Waits for the next feed message and folds it into local state.
    /// Returns true when a snapshot was applied; false once the feed has
    /// nothing more to deliver (terminated or closed).
    pub async fn pump(&mut self) -> bool {
        let Some(feed) = self.feed.as_mut() else {
            return false;
        };
        match feed.recv().await {
            Some(FeedMessage::Snapshot(records)) => {
                self.apply_snapshot(records);
                true
            }
            Some(FeedMessage::Terminated(e)) => {
                tracing::warn!(post = ?self.post, error = %e, "comment feed terminated");
                self.feed = None;
                self.state = FeedState::Lost(e);
                false
            }
            None => {
                tracing::warn!(post = ?self.post, "comment feed closed without a terminal message");
                self.feed = None;
                self.state = FeedState::Lost(Error::Unavailable("feed closed".to_string()));
                false
            }
        }
    }

    /// Every snapshot replaces the whole flat list and triggers a full
    /// rebuild. Correctness over micro-efficiency: there is no patching of
    /// the previous forest.
    fn apply_snapshot(&mut self, records: Vec<CommentRecord>) {
        self.comments = records
            .into_iter()
            .filter_map(Comment::from_record)
            .collect();
        self.roots = thread::build(self.comments.clone());
        if self.state != FeedState::Live {
            tracing::debug!(post = ?self.post, "comment feed is live");
            self.state = FeedState::Live;
        }
    }

    /// The actor identity, resolved on first use. Nothing identity-related
    /// happens before the first write.
    async fn identity(&mut self) -> Result<Identity, Error> {
        if let Some(id) = &self.identity {
            return Ok(id.clone());
        }
        let id = self.store.resolve_identity().await?;
        tracing::debug!(actor = ?id.id, "resolved actor identity");
        self.identity = Some(id.clone());
        Ok(id)
    }

    fn current_post(&self) -> Result<PostId, Error> {
        self.post
            .clone()
            .ok_or_else(|| Error::Unavailable("not subscribed to a post".to_string()))
    }

    async fn submit(
        &mut self,
        parent_id: Option<CommentId>,
        text: &str,
    ) -> Result<CommentId, Error> {
        validate_content(text)?;
        let post = self.current_post()?;
        let identity = self.identity().await?;
        let comment = NewComment {
            author_id: identity.id,
            author_name: identity
                .display_name
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            author_avatar_url: identity
                .avatar_url
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            content: text.trim().to_string(),
            parent_id,
        };
        self.store.create(&post, comment).await
    }

    /// Posts the composer text as a top-level comment. The composer is
    /// cleared only once the store accepted the write; on any failure the
    /// text stays put for the user to retry.
    pub async fn submit_root(&mut self) -> Result<CommentId, Error> {
        let text = self.composer.clone();
        let id = self.submit(None, &text).await?;
        self.composer.clear();
        Ok(id)
    }

    /// Posts the reply box of `parent` and closes it. The parent must be
    /// currently visible; the store does not check this for us.
    pub async fn submit_reply(&mut self, parent: CommentId) -> Result<CommentId, Error> {
        if self.find(&parent).is_none() {
            return Err(Error::UnknownComment(parent));
        }
        let text = self.reply_boxes.get(&parent).cloned().unwrap_or_default();
        let id = self.submit(Some(parent), &text).await?;
        self.reply_boxes.remove(&parent);
        Ok(id)
    }

    /// Sends one reaction toggle; the store applies it against its latest
    /// state, so nothing is lost to concurrent reactions from other actors.
    pub async fn toggle_reaction(
        &mut self,
        comment: CommentId,
        kind: ReactionKind,
    ) -> Result<(), Error> {
        if self.find(&comment).is_none() {
            return Err(Error::UnknownComment(comment));
        }
        let post = self.current_post()?;
        let actor = self.identity().await?.id;
        self.store
            .update(&post, comment, ReactionPatch { actor, kind })
            .await
    }

    /// Deletes a comment of our own. The author check here is UX only; the
    /// store performs the authoritative one. Replies to the deleted comment
    /// are left in place and simply drop out of the visible forest.
    pub async fn delete_own(&mut self, comment: CommentId) -> Result<(), Error> {
        let post = self.current_post()?;
        let actor = self.identity().await?.id;
        match self.find(&comment) {
            None => return Err(Error::UnknownComment(comment)),
            Some(c) if !c.is_authored_by(&actor) => return Err(Error::PermissionDenied),
            Some(_) => (),
        }
        self.store.delete(&post, comment, actor).await
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// The reply forest, rebuilt on every snapshot.
    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    /// Number of top-level threads; this is the count the section header
    /// displays.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    fn find(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == *id)
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn set_composer(&mut self, text: impl Into<String>) {
        self.composer = text.into();
    }

    /// Characters left in the composer budget, for the "n/500" display.
    pub fn composer_remaining(&self) -> usize {
        MAX_CONTENT_LEN.saturating_sub(self.composer.chars().count())
    }

    pub fn open_reply(&mut self, parent: CommentId) {
        self.reply_boxes.entry(parent).or_default();
    }

    /// None when the reply box for `parent` is closed.
    pub fn reply_text(&self, parent: &CommentId) -> Option<&str> {
        self.reply_boxes.get(parent).map(|s| s.as_str())
    }

    pub fn set_reply(&mut self, parent: CommentId, text: impl Into<String>) {
        self.reply_boxes.insert(parent, text.into());
    }

    pub fn cancel_reply(&mut self, parent: &CommentId) {
        self.reply_boxes.remove(parent);
    }

    /// Whether the delete control should show on `comment`. Before the first
    /// write there is no identity, so nothing is deletable.
    pub fn can_delete(&self, comment: &CommentId) -> bool {
        match (&self.identity, self.find(comment)) {
            (Some(me), Some(c)) => c.is_authored_by(&me.id),
            _ => false,
        }
    }
}
