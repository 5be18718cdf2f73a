use std::{
    collections::BTreeMap,
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use komento_client::{
    api::{
        self, CommentId, CommentRecord, Error, FeedMessage, Identity, NewComment, PostId,
        ReactionPatch, Time, UserId, Uuid,
    },
    reactions,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// In-memory realization of the comment store contract: per-post ordered
/// record lists, with watchers that get the full snapshot pushed on every
/// change. The `test_` methods are levers for exercising failure paths.
pub struct MockServer {
    state: Arc<Mutex<State>>,
}

struct State {
    posts: BTreeMap<PostId, PostThread>,
    offline: bool,
}

struct PostThread {
    /// Insertion order is creation order, which is also timestamp order
    records: Vec<CommentRecord>,
    watchers: Vec<mpsc::UnboundedSender<FeedMessage>>,
    last_stamp: Option<Time>,
}

impl PostThread {
    fn new() -> PostThread {
        PostThread {
            records: Vec::new(),
            watchers: Vec::new(),
            last_stamp: None,
        }
    }

    /// Server-assigned timestamps are strictly increasing within a post,
    /// even when the clock does not move between two writes.
    fn next_stamp(&mut self) -> Time {
        let mut stamp = Utc::now();
        if let Some(last) = self.last_stamp {
            if stamp <= last {
                stamp = last + Duration::milliseconds(1);
            }
        }
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl State {
    fn thread_mut(&mut self, post: &PostId) -> &mut PostThread {
        self.posts
            .entry(post.clone())
            .or_insert_with(PostThread::new)
    }

    fn check_online(&self) -> Result<(), Error> {
        match self.offline {
            true => Err(Error::Unavailable("store is offline".to_string())),
            false => Ok(()),
        }
    }

    fn broadcast(&mut self, post: &PostId) {
        let Some(thread) = self.posts.get_mut(post) else {
            return;
        };
        let snapshot = thread.records.clone();
        let before = thread.watchers.len();
        thread
            .watchers
            .retain_mut(|w| matches!(w.send(FeedMessage::Snapshot(snapshot.clone())), Ok(())));
        if thread.watchers.len() < before {
            tracing::debug!(
                post = ?post,
                pruned = before - thread.watchers.len(),
                "pruned dead comment feed watchers"
            );
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            state: Arc::new(Mutex::new(State {
                posts: BTreeMap::new(),
                offline: false,
            })),
        }
    }

    /// One client connection. Each handle owns its own lazily-created
    /// anonymous identity, like one browser tab does.
    pub fn connect(&self) -> MockClient {
        MockClient {
            state: self.state.clone(),
            identity: Mutex::new(None),
        }
    }

    /// Simulates losing the network: identity resolution, subscriptions and
    /// writes fail with `Unavailable` until switched back.
    pub fn test_set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Ends every live feed for `post` the way a revoked permission would:
    /// one terminal message, then the channel closes.
    pub fn test_terminate_feeds(&self, post: &PostId) {
        let mut state = self.state.lock();
        if let Some(thread) = state.posts.get_mut(post) {
            for w in thread.watchers.drain(..) {
                let _ = w.send(FeedMessage::Terminated(Error::PermissionDenied));
            }
        }
    }

    pub fn test_comment_count(&self, post: &PostId) -> usize {
        self.state
            .lock()
            .posts
            .get(post)
            .map(|t| t.records.len())
            .unwrap_or(0)
    }

    pub fn test_watcher_count(&self, post: &PostId) -> usize {
        self.state
            .lock()
            .posts
            .get(post)
            .map(|t| t.watchers.len())
            .unwrap_or(0)
    }
}

/// A client handle onto the mock store. The identity it resolves is stable
/// for the lifetime of the handle.
pub struct MockClient {
    state: Arc<Mutex<State>>,
    identity: Mutex<Option<Identity>>,
}

#[async_trait]
impl api::Store for MockClient {
    async fn resolve_identity(&self) -> Result<Identity, Error> {
        let mut identity = self.identity.lock();
        if let Some(id) = &*identity {
            return Ok(id.clone());
        }
        if self.state.lock().offline {
            return Err(Error::IdentityUnavailable(
                "store is offline".to_string(),
            ));
        }
        let fresh = Identity::anonymous(UserId(Uuid::new_v4()));
        tracing::debug!(actor = ?fresh.id, "created anonymous identity");
        *identity = Some(fresh.clone());
        Ok(fresh)
    }

    async fn subscribe(
        &self,
        post: &PostId,
    ) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error> {
        let mut state = self.state.lock();
        state.check_online()?;
        let thread = state.thread_mut(post);
        let (sender, receiver) = mpsc::unbounded_channel();
        // the current set is delivered right away, then on every change
        let _ = sender.send(FeedMessage::Snapshot(thread.records.clone()));
        thread.watchers.push(sender);
        Ok(receiver)
    }

    async fn create(&self, post: &PostId, comment: NewComment) -> Result<CommentId, Error> {
        api::validate_content(&comment.content)?;
        let mut state = self.state.lock();
        state.check_online()?;
        let thread = state.thread_mut(post);
        let id = CommentId(Uuid::new_v4());
        let created_at = thread.next_stamp();
        thread.records.push(CommentRecord {
            id,
            parent_id: comment.parent_id,
            author_id: Some(comment.author_id),
            author_name: Some(comment.author_name),
            author_avatar_url: Some(comment.author_avatar_url),
            content: comment.content,
            created_at: Some(created_at),
            reactions: BTreeMap::new(),
        });
        state.broadcast(post);
        Ok(id)
    }

    async fn update(
        &self,
        post: &PostId,
        comment: CommentId,
        patch: ReactionPatch,
    ) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.check_online()?;
        let thread = state
            .posts
            .get_mut(post)
            .ok_or_else(|| Error::UnknownPost(post.clone()))?;
        let record = thread
            .records
            .iter_mut()
            .find(|r| r.id == comment)
            .ok_or(Error::UnknownComment(comment))?;
        // applied under the lock against the latest map: concurrent toggles
        // from different actors merge instead of overwriting each other
        reactions::toggle(&mut record.reactions, patch.actor, patch.kind);
        state.broadcast(post);
        Ok(())
    }

    async fn delete(&self, post: &PostId, comment: CommentId, actor: UserId) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.check_online()?;
        let thread = state
            .posts
            .get_mut(post)
            .ok_or_else(|| Error::UnknownPost(post.clone()))?;
        let idx = thread
            .records
            .iter()
            .position(|r| r.id == comment)
            .ok_or(Error::UnknownComment(comment))?;
        // the authoritative author check; the client-side one is UX only
        if thread.records[idx].author_id != Some(actor) {
            return Err(Error::PermissionDenied);
        }
        thread.records.remove(idx);
        // replies keep their parent_id and simply become unreachable
        state.broadcast(post);
        Ok(())
    }
}
