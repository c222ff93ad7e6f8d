//! In-memory fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::data::post_repository::{
    NewComment, NewPost, PostPatch, PostRepository, PostSearch,
};
use crate::data::user_repository::{
    NewUser, UserCredentials, UserPatch, UserRepository,
};
use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Post};
use crate::domain::user::{User, UserStatus};

pub(crate) fn sample_user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        status: UserStatus::Active,
        is_admin: false,
        profile_picture: String::new(),
        cover_picture: String::new(),
        description: String::new(),
        city: String::new(),
        home_town: String::new(),
        relationship: String::new(),
        followers: Vec::new(),
        followings: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_post(id: i64, author_id: i64, title: &str) -> Post {
    Post {
        id,
        author_id,
        title: title.to_string(),
        description: String::new(),
        image: None,
        category: "Other".to_string(),
        likes: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeUserRepo {
    users: Arc<Mutex<Vec<User>>>,
    credentials: Arc<Mutex<Option<UserCredentials>>>,
    created: Arc<Mutex<Option<NewUser>>>,
    create_error: Arc<Mutex<Option<DomainError>>>,
    last_patch: Arc<Mutex<Option<(i64, UserPatch)>>>,
}

impl FakeUserRepo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, user: User) {
        self.users.lock().expect("users mutex poisoned").push(user);
    }

    pub(crate) fn get(&self, id: i64) -> Option<User> {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .iter()
            .find(|user| user.id == id)
            .cloned()
    }

    pub(crate) fn set_credentials(&self, creds: UserCredentials) {
        *self.credentials.lock().expect("credentials mutex poisoned") = Some(creds);
    }

    pub(crate) fn fail_create_with(&self, err: DomainError) {
        *self.create_error.lock().expect("create_error mutex poisoned") = Some(err);
    }

    pub(crate) fn take_created(&self) -> Option<NewUser> {
        self.created.lock().expect("created mutex poisoned").take()
    }

    pub(crate) fn take_patch(&self) -> Option<(i64, UserPatch)> {
        self.last_patch.lock().expect("last_patch mutex poisoned").take()
    }
}

#[async_trait]
impl UserRepository for FakeUserRepo {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        if let Some(err) = self.create_error.lock().expect("create_error mutex poisoned").take() {
            return Err(err);
        }
        *self.created.lock().expect("created mutex poisoned") = Some(input.clone());

        let users = self.users.lock().expect("users mutex poisoned");
        users
            .iter()
            .find(|user| user.username == input.username)
            .cloned()
            .ok_or_else(|| DomainError::Unexpected("no user seeded for create".to_string()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_credentials(
        &self,
        _identifier: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        Ok(self.credentials.lock().expect("credentials mutex poisoned").clone())
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, DomainError> {
        *self.last_patch.lock().expect("last_patch mutex poisoned") = Some((id, patch.clone()));

        let mut users = self.users.lock().expect("users mutex poisoned");
        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(description) = patch.description {
            user.description = description;
        }
        if let Some(profile_picture) = patch.profile_picture {
            user.profile_picture = profile_picture;
        }
        if let Some(cover_picture) = patch.cover_picture {
            user.cover_picture = cover_picture;
        }
        if let Some(status) = patch.status {
            user.status = status;
        }
        if let Some(is_admin) = patch.is_admin {
            user.is_admin = is_admin;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok(users.len() < before)
    }

    async fn list_users(&self, limit: Option<i64>) -> Result<Vec<User>, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned").clone();
        users.sort_by_key(|user| std::cmp::Reverse(user.id));
        if let Some(limit) = limit {
            users.truncate(limit as usize);
        }
        Ok(users)
    }

    async fn search_by_username(&self, query: &str) -> Result<Vec<User>, DomainError> {
        let needle = query.to_lowercase();
        Ok(self
            .users
            .lock()
            .expect("users mutex poisoned")
            .iter()
            .filter(|user| user.username.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn follow(&self, target_id: i64, follower_id: i64) -> Result<bool, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let Some(target) = users.iter().position(|user| user.id == target_id) else {
            return Err(DomainError::NotFound(format!("user id: {target_id}")));
        };
        if users[target].followers.contains(&follower_id) {
            return Ok(false);
        }
        users[target].followers.push(follower_id);
        if let Some(follower) = users.iter_mut().find(|user| user.id == follower_id) {
            follower.followings.push(target_id);
        }
        Ok(true)
    }

    async fn unfollow(&self, target_id: i64, follower_id: i64) -> Result<bool, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let Some(target) = users.iter().position(|user| user.id == target_id) else {
            return Err(DomainError::NotFound(format!("user id: {target_id}")));
        };
        if !users[target].followers.contains(&follower_id) {
            return Ok(false);
        }
        users[target].followers.retain(|id| *id != follower_id);
        if let Some(follower) = users.iter_mut().find(|user| user.id == follower_id) {
            follower.followings.retain(|id| *id != target_id);
        }
        Ok(true)
    }

    async fn toggle_status(&self, id: i64) -> Result<Option<UserStatus>, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };
        user.status = user.status.toggled();
        Ok(Some(user.status))
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakePostRepo {
    posts: Arc<Mutex<Vec<Post>>>,
    comments: Arc<Mutex<Vec<Comment>>>,
    next_id: Arc<Mutex<i64>>,
    last_search: Arc<Mutex<Option<PostSearch>>>,
}

impl FakePostRepo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, post: Post) {
        self.posts.lock().expect("posts mutex poisoned").push(post);
    }

    pub(crate) fn insert_comment(&self, comment: Comment) {
        self.comments
            .lock()
            .expect("comments mutex poisoned")
            .push(comment);
    }

    pub(crate) fn take_search(&self) -> Option<PostSearch> {
        self.last_search.lock().expect("last_search mutex poisoned").take()
    }

    fn alloc_id(&self) -> i64 {
        let mut next = self.next_id.lock().expect("next_id mutex poisoned");
        *next += 1000;
        *next
    }
}

#[async_trait]
impl PostRepository for FakePostRepo {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let post = Post {
            id: self.alloc_id(),
            author_id: input.author_id,
            title: input.title,
            description: input.description,
            image: input.image,
            category: input.category,
            likes: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self
            .posts
            .lock()
            .expect("posts mutex poisoned")
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let Some(post) = posts.iter_mut().find(|post| post.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(description) = patch.description {
            post.description = description;
        }
        if let Some(category) = patch.category {
            post.category = category;
        }
        if let Some(image) = patch.image {
            post.image = Some(image);
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let before = posts.len();
        posts.retain(|post| post.id != id);
        Ok(posts.len() < before)
    }

    async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.lock().expect("posts mutex poisoned").clone())
    }

    async fn list_by_authors(&self, author_ids: &[i64]) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.lock().expect("posts mutex poisoned");
        let mut by_author: HashMap<i64, Vec<Post>> = HashMap::new();
        for post in posts.iter() {
            by_author
                .entry(post.author_id)
                .or_default()
                .push(post.clone());
        }
        Ok(author_ids
            .iter()
            .flat_map(|id| by_author.remove(id).unwrap_or_default())
            .collect())
    }

    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<bool>, DomainError> {
        let mut posts = self.posts.lock().expect("posts mutex poisoned");
        let Some(post) = posts.iter_mut().find(|post| post.id == post_id) else {
            return Ok(None);
        };
        if post.likes.contains(&user_id) {
            post.likes.retain(|id| *id != user_id);
            Ok(Some(false))
        } else {
            post.likes.push(user_id);
            Ok(Some(true))
        }
    }

    async fn search(&self, search: PostSearch) -> Result<Vec<Post>, DomainError> {
        let results = {
            let posts = self.posts.lock().expect("posts mutex poisoned");
            posts
                .iter()
                .filter(|post| search.author_ids.contains(&post.author_id))
                .filter(|post| match &search.query {
                    Some(query) => {
                        let needle = query.to_lowercase();
                        post.title.to_lowercase().contains(&needle)
                            || post.description.to_lowercase().contains(&needle)
                            || post.category.to_lowercase().contains(&needle)
                    }
                    None => true,
                })
                .cloned()
                .collect()
        };
        *self.last_search.lock().expect("last_search mutex poisoned") = Some(search);
        Ok(results)
    }

    async fn add_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let comment = Comment {
            id: self.alloc_id(),
            post_id: input.post_id,
            author_id: input.author_id,
            username: input.username,
            text: input.text,
            created_at: Utc::now(),
        };
        self.insert_comment(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        Ok(self
            .comments
            .lock()
            .expect("comments mutex poisoned")
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>, DomainError> {
        Ok(self
            .comments
            .lock()
            .expect("comments mutex poisoned")
            .iter()
            .find(|comment| comment.id == comment_id)
            .cloned())
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, DomainError> {
        let mut comments = self.comments.lock().expect("comments mutex poisoned");
        let before = comments.len();
        comments.retain(|comment| comment.id != comment_id);
        Ok(comments.len() < before)
    }
}
