use crate::data::post_repository::{NewComment, NewPost, PostPatch, PostRepository, PostSearch};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::post::{
    Comment, CommentRequest, CreatePostRequest, Post, PostSort, SearchFilter, UpdatePostRequest,
};

pub(crate) struct PostService<P: PostRepository, U: UserRepository> {
    posts: P,
    users: U,
}

impl<P: PostRepository, U: UserRepository> PostService<P, U> {
    pub(crate) fn new(posts: P, users: U) -> Self {
        Self { posts, users }
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        self.posts
            .create_post(NewPost {
                author_id,
                title: req.title,
                description: req.description,
                category: req.category,
                image: req.image,
            })
            .await
    }

    pub(crate) async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.list_all().await?;
        if posts.is_empty() {
            return Err(DomainError::NotFound("posts".to_string()));
        }
        Ok(posts)
    }

    pub(crate) async fn update_post(
        &self,
        actor_id: i64,
        post_id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let post = self.get_post(post_id).await?;
        // Only the owner may edit; admins may delete but not rewrite.
        if post.author_id != actor_id {
            return Err(DomainError::Forbidden);
        }

        let patch = PostPatch {
            title: req.title,
            description: req.description,
            category: req.category,
            image: req.image,
        };
        self.posts
            .update_post(post_id, patch)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))
    }

    pub(crate) async fn delete_post(
        &self,
        actor_id: i64,
        actor_is_admin: bool,
        post_id: i64,
    ) -> Result<(), DomainError> {
        let post = self.get_post(post_id).await?;
        if post.author_id != actor_id && !actor_is_admin {
            return Err(DomainError::Forbidden);
        }

        let deleted = self.posts.delete_post(post_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }
        Ok(())
    }

    /// Returns whether the post is liked by the actor after the toggle.
    pub(crate) async fn toggle_like(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<bool, DomainError> {
        self.posts
            .toggle_like(post_id, actor_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))
    }

    pub(crate) async fn add_comment(
        &self,
        actor_id: i64,
        actor_username: &str,
        post_id: i64,
        req: CommentRequest,
    ) -> Result<Comment, DomainError> {
        let req = req.validate()?;
        self.get_post(post_id).await?;
        self.posts
            .add_comment(NewComment {
                post_id,
                author_id: actor_id,
                username: actor_username.to_string(),
                text: req.text,
            })
            .await
    }

    pub(crate) async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.get_post(post_id).await?;
        self.posts.list_comments(post_id).await
    }

    pub(crate) async fn delete_comment(
        &self,
        actor_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        self.get_post(post_id).await?;
        let comment = self
            .posts
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::NotFound(format!("comment id: {comment_id}")))?;

        if comment.author_id != actor_id {
            return Err(DomainError::Forbidden);
        }

        let deleted = self.posts.delete_comment(comment_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("comment id: {comment_id}")));
        }
        Ok(())
    }

    /// Own posts first, then posts per followed user, source order. The
    /// result is intentionally not merged by recency.
    pub(crate) async fn timeline(&self, actor_id: i64) -> Result<Vec<Post>, DomainError> {
        let user = self
            .users
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {actor_id}")))?;

        let mut posts = self.posts.list_by_authors(&[actor_id]).await?;
        if !user.followings.is_empty() {
            posts.extend(self.posts.list_by_authors(&user.followings).await?);
        }
        Ok(posts)
    }

    pub(crate) async fn posts_by_user(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.list_by_authors(&[author_id]).await?;
        if posts.is_empty() {
            return Err(DomainError::NotFound(format!(
                "posts for user id: {author_id}"
            )));
        }
        Ok(posts)
    }

    pub(crate) async fn search(
        &self,
        actor_id: i64,
        query: Option<String>,
        filter: SearchFilter,
        sort: PostSort,
    ) -> Result<Vec<Post>, DomainError> {
        let user = self
            .users
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {actor_id}")))?;

        let author_ids = match filter {
            SearchFilter::OnlyMine => vec![actor_id],
            SearchFilter::ExcludeMine => user.followings,
            SearchFilter::MineAndFollowed => {
                let mut ids = vec![actor_id];
                ids.extend(user.followings);
                ids
            }
        };

        self.posts
            .search(PostSearch {
                query: query.map(|query| query.trim().to_string()),
                author_ids,
                sort,
            })
            .await
    }

    async fn get_post(&self, post_id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::PostService;
    use crate::application::test_support::{
        FakePostRepo, FakeUserRepo, sample_post, sample_user,
    };
    use crate::data::post_repository::PostRepository;
    use crate::domain::error::DomainError;
    use crate::domain::post::{
        CommentRequest, CreatePostRequest, PostSort, SearchFilter, UpdatePostRequest,
    };

    fn service(
        posts: &FakePostRepo,
        users: &FakeUserRepo,
    ) -> PostService<FakePostRepo, FakeUserRepo> {
        PostService::new(posts.clone(), users.clone())
    }

    #[tokio::test]
    async fn create_post_attaches_author_and_normalizes() {
        let posts = FakePostRepo::new();
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let post = service
            .create_post(
                10,
                CreatePostRequest {
                    title: "  First trip  ".to_string(),
                    description: String::new(),
                    category: "Travel".to_string(),
                    image: Some("/uploads/a.png".to_string()),
                },
            )
            .await
            .expect("create must succeed");

        assert_eq!(post.author_id, 10);
        assert_eq!(post.title, "First trip");
        assert_eq!(post.image.as_deref(), Some("/uploads/a.png"));
    }

    #[tokio::test]
    async fn list_all_reports_empty_collection_as_not_found() {
        let posts = FakePostRepo::new();
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let err = service.list_all().await.expect_err("must be empty");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_post_is_owner_only() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 10, "mine"));
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let req = UpdatePostRequest {
            title: Some("edited".to_string()),
            ..UpdatePostRequest::default()
        };
        let err = service
            .update_post(11, 1, req.clone())
            .await
            .expect_err("non-owner must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        let updated = service
            .update_post(10, 1, req)
            .await
            .expect("owner update succeeds");
        assert_eq!(updated.title, "edited");
    }

    #[tokio::test]
    async fn delete_post_allows_owner_and_admin_only() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 10, "mine"));
        posts.insert(sample_post(2, 10, "also mine"));
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let err = service
            .delete_post(11, false, 1)
            .await
            .expect_err("stranger must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        service
            .delete_post(10, false, 1)
            .await
            .expect("owner delete succeeds");
        service
            .delete_post(11, true, 2)
            .await
            .expect("admin delete succeeds");

        let err = service
            .delete_post(10, false, 1)
            .await
            .expect_err("already gone");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn like_toggle_round_trips() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 10, "mine"));
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        assert!(service.toggle_like(5, 1).await.expect("first toggle"));
        assert!(!service.toggle_like(5, 1).await.expect("second toggle"));

        let post = posts.get_post(1).await.expect("repo ok").expect("exists");
        assert!(post.likes.is_empty());
    }

    #[tokio::test]
    async fn comment_captures_token_username() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 10, "mine"));
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let comment = service
            .add_comment(
                5,
                "alice",
                1,
                CommentRequest {
                    text: "  nice!  ".to_string(),
                },
            )
            .await
            .expect("comment must be added");

        assert_eq!(comment.username, "alice");
        assert_eq!(comment.text, "nice!");

        let err = service
            .add_comment(
                5,
                "alice",
                404,
                CommentRequest {
                    text: "hello".to_string(),
                },
            )
            .await
            .expect_err("missing post");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_commenter_may_delete_a_comment() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 10, "mine"));
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let comment = service
            .add_comment(
                5,
                "alice",
                1,
                CommentRequest {
                    text: "hello".to_string(),
                },
            )
            .await
            .expect("comment added");

        let err = service
            .delete_comment(6, 1, comment.id)
            .await
            .expect_err("other user must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        service
            .delete_comment(5, 1, comment.id)
            .await
            .expect("commenter delete succeeds");
        assert!(service
            .list_comments(1)
            .await
            .expect("list ok")
            .is_empty());
    }

    #[tokio::test]
    async fn timeline_concatenates_own_then_followed() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 2, "bob's"));
        posts.insert(sample_post(2, 1, "alice's"));
        let users = FakeUserRepo::new();
        let mut alice = sample_user(1, "alice");
        alice.followings = vec![2];
        users.insert(alice);
        let service = service(&posts, &users);

        let timeline = service.timeline(1).await.expect("timeline must build");
        let ids: Vec<i64> = timeline.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn timeline_without_followings_is_own_posts_only() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 1, "alice's"));
        posts.insert(sample_post(2, 2, "bob's"));
        let users = FakeUserRepo::new();
        users.insert(sample_user(1, "alice"));
        let service = service(&posts, &users);

        let timeline = service.timeline(1).await.expect("timeline must build");
        let ids: Vec<i64> = timeline.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn search_scopes_authors_by_filter() {
        let posts = FakePostRepo::new();
        let users = FakeUserRepo::new();
        let mut alice = sample_user(1, "alice");
        alice.followings = vec![2, 3];
        users.insert(alice);
        let service = service(&posts, &users);

        service
            .search(1, None, SearchFilter::OnlyMine, PostSort::Title)
            .await
            .expect("search ok");
        assert_eq!(posts.take_search().expect("captured").author_ids, vec![1]);

        service
            .search(1, None, SearchFilter::ExcludeMine, PostSort::Title)
            .await
            .expect("search ok");
        assert_eq!(posts.take_search().expect("captured").author_ids, vec![2, 3]);

        service
            .search(1, Some(" trip ".to_string()), SearchFilter::MineAndFollowed, PostSort::Date)
            .await
            .expect("search ok");
        let captured = posts.take_search().expect("captured");
        assert_eq!(captured.author_ids, vec![1, 2, 3]);
        assert_eq!(captured.query.as_deref(), Some("trip"));
        assert_eq!(captured.sort, PostSort::Date);
    }

    #[tokio::test]
    async fn only_my_posts_filter_returns_only_callers_posts() {
        let posts = FakePostRepo::new();
        posts.insert(sample_post(1, 1, "mine"));
        posts.insert(sample_post(2, 2, "bob's"));
        let users = FakeUserRepo::new();
        let mut alice = sample_user(1, "alice");
        alice.followings = vec![2];
        users.insert(alice);
        let service = service(&posts, &users);

        let results = service
            .search(1, None, SearchFilter::OnlyMine, PostSort::Title)
            .await
            .expect("search ok");
        assert!(results.iter().all(|post| post.author_id == 1));
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn posts_by_user_reports_missing_as_not_found() {
        let posts = FakePostRepo::new();
        let users = FakeUserRepo::new();
        let service = service(&posts, &users);

        let err = service.posts_by_user(1).await.expect_err("no posts");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
