//! End-to-end scenarios: the comment section controller talking to the
//! in-memory store, snapshots flowing back, trees rebuilt.

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use komento_api::{Error, PostId, ReactionKind};
    use komento_client::{reactions, CommentSection, FeedState};
    use komento_mock_server::{MockClient, MockServer};

    async fn live_section(server: &MockServer, slug: &str) -> CommentSection<MockClient> {
        let mut section = CommentSection::new(server.connect());
        section
            .subscribe(PostId::new(slug))
            .await
            .expect("subscribing");
        assert!(section.pump().await, "initial snapshot expected");
        section
    }

    /// Folds in every snapshot already sitting on the feed.
    async fn drain(section: &mut CommentSection<MockClient>) {
        while let Some(true) = section.pump().now_or_never() {}
    }

    #[tokio::test]
    async fn lifecycle_goes_live_on_first_snapshot() {
        let server = MockServer::new();
        let mut section = CommentSection::new(server.connect());
        assert_eq!(section.state(), &FeedState::Unsubscribed);

        section
            .subscribe(PostId::new("hello-world"))
            .await
            .expect("subscribing");
        assert_eq!(section.state(), &FeedState::Subscribing);

        assert!(section.pump().await);
        assert_eq!(section.state(), &FeedState::Live);
        assert_eq!(section.root_count(), 0);

        section.unsubscribe();
        assert_eq!(section.state(), &FeedState::Unsubscribed);
    }

    #[tokio::test]
    async fn threads_nest_replies_under_their_parents() -> anyhow::Result<()> {
        let server = MockServer::new();
        let mut section = live_section(&server, "threading").await;

        section.set_composer("top-level remark");
        let root = section.submit_root().await?;
        drain(&mut section).await;

        section.set_reply(root, "first reply");
        let first = section.submit_reply(root).await?;
        section.set_reply(root, "second reply");
        let second = section.submit_reply(root).await?;
        drain(&mut section).await;

        section.set_reply(first, "nested reply");
        let nested = section.submit_reply(first).await?;
        drain(&mut section).await;

        assert_eq!(section.root_count(), 1);
        let tree = &section.roots()[0];
        assert_eq!(tree.comment.id, root);
        let children: Vec<_> = tree.children.iter().map(|n| n.comment.id).collect();
        assert_eq!(children, vec![first, second]);
        assert_eq!(tree.children[0].children[0].comment.id, nested);
        assert!(tree.children[1].children.is_empty());
        assert_eq!(tree.subtree_len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn empty_composer_is_rejected_before_the_store() {
        let server = MockServer::new();
        let post = PostId::new("validation");
        let mut section = live_section(&server, "validation").await;

        section.set_composer("   \n ");
        assert_eq!(section.submit_root().await, Err(Error::EmptyContent));
        assert_eq!(server.test_comment_count(&post), 0);

        section.set_composer("y".repeat(501));
        assert_eq!(section.submit_root().await, Err(Error::ContentTooLong(501)));
        assert_eq!(server.test_comment_count(&post), 0);
        // failed submissions leave the composer alone
        assert_eq!(section.composer().chars().count(), 501);
        assert_eq!(section.composer_remaining(), 0);
    }

    #[tokio::test]
    async fn failed_identity_resolution_aborts_the_write() -> anyhow::Result<()> {
        let server = MockServer::new();
        let post = PostId::new("offline");
        let mut section = live_section(&server, "offline").await;

        section.set_composer("drafted while offline");
        server.test_set_offline(true);
        assert!(matches!(
            section.submit_root().await,
            Err(Error::IdentityUnavailable(_))
        ));
        assert_eq!(server.test_comment_count(&post), 0);
        assert_eq!(section.composer(), "drafted while offline");

        // retryable: the same draft goes through once the store is back
        server.test_set_offline(false);
        section.submit_root().await?;
        assert_eq!(section.composer(), "");
        assert_eq!(server.test_comment_count(&post), 1);
        Ok(())
    }

    #[tokio::test]
    async fn reply_requires_a_visible_parent() {
        let server = MockServer::new();
        let mut section = live_section(&server, "replies").await;

        let ghost = komento_api::CommentId::stub();
        section.set_reply(ghost, "into the void");
        assert_eq!(
            section.submit_reply(ghost).await,
            Err(Error::UnknownComment(ghost))
        );
    }

    #[tokio::test]
    async fn posting_a_reply_closes_its_box() -> anyhow::Result<()> {
        let server = MockServer::new();
        let mut section = live_section(&server, "reply-boxes").await;

        section.set_composer("root");
        let root = section.submit_root().await?;
        drain(&mut section).await;

        section.open_reply(root);
        assert_eq!(section.reply_text(&root), Some(""));
        section.set_reply(root, "  a reply  ");
        section.submit_reply(root).await?;
        assert_eq!(section.reply_text(&root), None);
        drain(&mut section).await;

        // content is stored trimmed
        assert_eq!(section.roots()[0].children[0].comment.content, "a reply");

        // an empty box is rejected and stays open
        section.open_reply(root);
        assert_eq!(section.submit_reply(root).await, Err(Error::EmptyContent));
        assert_eq!(section.reply_text(&root), Some(""));
        Ok(())
    }

    #[tokio::test]
    async fn reaction_toggles_round_trip_through_the_store() -> anyhow::Result<()> {
        let server = MockServer::new();
        let mut section = live_section(&server, "reacting").await;

        section.set_composer("react to me");
        let id = section.submit_root().await?;
        drain(&mut section).await;

        let hearts = |section: &CommentSection<MockClient>| {
            reactions::count(&section.roots()[0].comment.reactions, ReactionKind::Heart)
        };
        let thumbs = |section: &CommentSection<MockClient>| {
            reactions::count(&section.roots()[0].comment.reactions, ReactionKind::Thumb)
        };

        section.toggle_reaction(id, ReactionKind::Heart).await?;
        drain(&mut section).await;
        assert_eq!(hearts(&section), 1);

        section.toggle_reaction(id, ReactionKind::Heart).await?;
        drain(&mut section).await;
        assert_eq!(hearts(&section), 0);

        section.toggle_reaction(id, ReactionKind::Thumb).await?;
        drain(&mut section).await;
        assert_eq!(thumbs(&section), 1);
        assert_eq!(hearts(&section), 0);

        // one actor, so across every kind there is exactly one reaction
        let total: usize = ReactionKind::ALL
            .iter()
            .map(|k| reactions::count(&section.roots()[0].comment.reactions, *k))
            .sum();
        assert_eq!(total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_write_leaves_the_draft_in_place() -> anyhow::Result<()> {
        let server = MockServer::new();
        let post = PostId::new("flaky");
        let mut section = live_section(&server, "flaky").await;

        // identity already resolved by a successful write
        section.set_composer("first");
        section.submit_root().await?;
        drain(&mut section).await;

        section.set_composer("second");
        server.test_set_offline(true);
        assert!(matches!(
            section.submit_root().await,
            Err(Error::Unavailable(_))
        ));
        assert_eq!(section.composer(), "second");
        assert_eq!(server.test_comment_count(&post), 1);

        server.test_set_offline(false);
        section.submit_root().await?;
        assert_eq!(server.test_comment_count(&post), 2);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_root_hides_its_replies() -> anyhow::Result<()> {
        let server = MockServer::new();
        let post = PostId::new("deleting");
        let mut section = live_section(&server, "deleting").await;

        section.set_composer("doomed root");
        let root = section.submit_root().await?;
        drain(&mut section).await;

        section.set_reply(root, "reply one");
        section.submit_reply(root).await?;
        section.set_reply(root, "reply two");
        let two = section.submit_reply(root).await?;
        drain(&mut section).await;

        section.set_reply(two, "deep reply");
        section.submit_reply(two).await?;
        drain(&mut section).await;
        assert!(section.can_delete(&root));

        section.delete_own(root).await?;
        drain(&mut section).await;

        // no cascade: the replies still exist in the store, but with their
        // parent gone they drop out of the visible forest
        assert_eq!(server.test_comment_count(&post), 3);
        assert_eq!(section.root_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn only_the_author_may_delete() -> anyhow::Result<()> {
        let server = MockServer::new();
        let mut author = live_section(&server, "authz").await;
        let mut visitor = live_section(&server, "authz").await;

        author.set_composer("my comment");
        let id = author.submit_root().await?;
        drain(&mut visitor).await;

        assert!(!visitor.can_delete(&id));
        assert_eq!(visitor.delete_own(id).await, Err(Error::PermissionDenied));
        assert_eq!(server.test_comment_count(&PostId::new("authz")), 1);
        Ok(())
    }

    #[tokio::test]
    async fn switching_posts_cancels_the_old_feed() -> anyhow::Result<()> {
        let server = MockServer::new();
        let old_post = PostId::new("old-post");
        let mut section = live_section(&server, "old-post").await;
        let mut other = live_section(&server, "old-post").await;

        other.set_composer("seed");
        other.submit_root().await?;
        drain(&mut section).await;
        assert_eq!(section.root_count(), 1);

        section.subscribe(PostId::new("new-post")).await?;
        assert!(section.pump().await);
        assert_eq!(section.root_count(), 0);

        // traffic on the old post must not reach the re-pointed section
        other.set_composer("more on the old post");
        other.submit_root().await?;
        assert_eq!(section.pump().now_or_never(), None);
        assert_eq!(section.root_count(), 0);
        // and its dead watcher is gone from the old post after that broadcast
        assert_eq!(server.test_watcher_count(&old_post), 1);
        Ok(())
    }

    #[tokio::test]
    async fn terminated_feed_surfaces_and_can_be_retried() -> anyhow::Result<()> {
        let server = MockServer::new();
        let post = PostId::new("revoked");
        let mut section = live_section(&server, "revoked").await;

        server.test_terminate_feeds(&post);
        assert!(!section.pump().await);
        assert_eq!(
            section.state(),
            &FeedState::Lost(Error::PermissionDenied)
        );

        // manual retry re-establishes the live query
        section.resubscribe().await?;
        assert!(section.pump().await);
        assert_eq!(section.state(), &FeedState::Live);
        Ok(())
    }

    #[tokio::test]
    async fn identity_appears_only_at_the_first_write() -> anyhow::Result<()> {
        let server = MockServer::new();
        let mut reader = live_section(&server, "lurking").await;
        let mut writer = live_section(&server, "lurking").await;

        writer.set_composer("hello");
        let id = writer.submit_root().await?;
        drain(&mut reader).await;
        drain(&mut writer).await;

        // the reader never wrote, so it has no identity and owns nothing
        assert!(!reader.can_delete(&id));
        // the writer's first write pinned its identity to the comment
        assert!(writer.can_delete(&id));
        Ok(())
    }
}
