use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Post, PostSort};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) author_id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) image: Option<String>,
}

/// Column-level patch applied to a post row. `None` means "leave as is".
#[derive(Debug, Clone, Default)]
pub(crate) struct PostPatch {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) image: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewComment {
    pub(crate) post_id: i64,
    pub(crate) author_id: i64,
    pub(crate) username: String,
    pub(crate) text: String,
}

/// Fully resolved search: the author scope is already a concrete id set.
#[derive(Debug, Clone)]
pub(crate) struct PostSearch {
    pub(crate) query: Option<String>,
    pub(crate) author_ids: Vec<i64>,
    pub(crate) sort: PostSort,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError>;

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;

    async fn list_all(&self) -> Result<Vec<Post>, DomainError>;

    /// Posts grouped by the order of `author_ids`, insertion order within
    /// each author.
    async fn list_by_authors(&self, author_ids: &[i64]) -> Result<Vec<Post>, DomainError>;

    /// Atomically flips membership of `user_id` in the post's likes set.
    /// Returns whether the post is liked after the toggle, `None` for a
    /// missing post.
    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<bool>, DomainError>;

    async fn search(&self, search: PostSearch) -> Result<Vec<Post>, DomainError>;

    async fn add_comment(&self, input: NewComment) -> Result<Comment, DomainError>;

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError>;

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>, DomainError>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, DomainError>;
}
