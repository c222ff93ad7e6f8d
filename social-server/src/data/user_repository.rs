use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::user::{User, UserStatus};

#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
}

/// Column-level patch applied to a user row. `None` means "leave as is".
#[derive(Debug, Clone, Default)]
pub(crate) struct UserPatch {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password_hash: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) home_town: Option<String>,
    pub(crate) relationship: Option<String>,
    pub(crate) profile_picture: Option<String>,
    pub(crate) cover_picture: Option<String>,
    pub(crate) status: Option<UserStatus>,
    pub(crate) is_admin: Option<bool>,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;

    /// Looks the user up by username or email, password hash included.
    async fn find_credentials(
        &self,
        identifier: &str,
    ) -> Result<Option<UserCredentials>, DomainError>;

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, DomainError>;

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError>;

    /// Newest-first listing; `limit` caps the result when present.
    async fn list_users(&self, limit: Option<i64>) -> Result<Vec<User>, DomainError>;

    /// Case-insensitive substring match on username.
    async fn search_by_username(&self, query: &str) -> Result<Vec<User>, DomainError>;

    /// Adds `follower_id` to the target's followers and the target to the
    /// follower's followings, both inside one transaction. Returns `false`
    /// without writing when the link already exists.
    async fn follow(&self, target_id: i64, follower_id: i64) -> Result<bool, DomainError>;

    /// Symmetric removal; returns `false` when no link existed.
    async fn unfollow(&self, target_id: i64, follower_id: i64) -> Result<bool, DomainError>;

    async fn toggle_status(&self, id: i64) -> Result<Option<UserStatus>, DomainError>;
}
