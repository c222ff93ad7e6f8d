use crate::data::user_repository::{UserPatch, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{UpdateUserRequest, User, UserStatus};

use super::auth_service::hash_password;

#[derive(Debug, Clone, Copy)]
pub(crate) enum PictureKind {
    Profile,
    Cover,
}

pub(crate) struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn get_profile(&self, id: i64) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {id}")))
    }

    /// Used by the auth middleware: the account must exist and be active.
    pub(crate) async fn require_active(&self, id: i64) -> Result<User, DomainError> {
        let user = self.repo.find_by_id(id).await?;
        match user {
            Some(user) if user.status == UserStatus::Active => Ok(user),
            _ => Err(DomainError::Forbidden),
        }
    }

    pub(crate) async fn update_profile(
        &self,
        actor_id: i64,
        actor_is_admin: bool,
        target_id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        authorize_self_or_admin(actor_id, actor_is_admin, target_id)?;
        let req = req.validate()?;
        if req.is_empty() {
            return Err(DomainError::Validation {
                field: "body",
                message: "no fields to update",
            });
        }
        // Role and status edits stay admin-only even on one's own account.
        if (req.is_admin.is_some() || req.status.is_some()) && !actor_is_admin {
            return Err(DomainError::Forbidden);
        }

        let password_hash = req.password.as_deref().map(hash_password).transpose()?;
        let patch = UserPatch {
            username: req.username,
            email: req.email,
            password_hash,
            description: req.description,
            city: req.city,
            home_town: req.home_town,
            relationship: req.relationship,
            profile_picture: req.profile_picture,
            cover_picture: req.cover_picture,
            status: req.status,
            is_admin: req.is_admin,
        };

        self.repo
            .update_user(target_id, patch)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {target_id}")))
    }

    pub(crate) async fn delete_account(
        &self,
        actor_id: i64,
        actor_is_admin: bool,
        target_id: i64,
    ) -> Result<(), DomainError> {
        authorize_self_or_admin(actor_id, actor_is_admin, target_id)?;
        let deleted = self.repo.delete_user(target_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("user id: {target_id}")));
        }
        Ok(())
    }

    pub(crate) async fn follow(&self, actor_id: i64, target_id: i64) -> Result<(), DomainError> {
        if actor_id == target_id {
            return Err(DomainError::Forbidden);
        }
        let applied = self.repo.follow(target_id, actor_id).await?;
        if !applied {
            // Already following.
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }

    pub(crate) async fn unfollow(&self, actor_id: i64, target_id: i64) -> Result<(), DomainError> {
        if actor_id == target_id {
            return Err(DomainError::Forbidden);
        }
        let applied = self.repo.unfollow(target_id, actor_id).await?;
        if !applied {
            // Not following in the first place.
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }

    pub(crate) async fn search(&self, query: &str) -> Result<Vec<User>, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::Validation {
                field: "query",
                message: "must not be empty",
            });
        }
        self.repo.search_by_username(query).await
    }

    pub(crate) async fn list_users(
        &self,
        actor_is_admin: bool,
        limit: Option<i64>,
    ) -> Result<Vec<User>, DomainError> {
        if !actor_is_admin {
            return Err(DomainError::Forbidden);
        }
        self.repo.list_users(limit).await
    }

    pub(crate) async fn toggle_status(
        &self,
        actor_is_admin: bool,
        target_id: i64,
    ) -> Result<UserStatus, DomainError> {
        if !actor_is_admin {
            return Err(DomainError::Forbidden);
        }
        self.repo
            .toggle_status(target_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {target_id}")))
    }

    pub(crate) async fn set_picture(
        &self,
        actor_id: i64,
        actor_is_admin: bool,
        target_id: i64,
        kind: PictureKind,
        path: String,
    ) -> Result<User, DomainError> {
        authorize_self_or_admin(actor_id, actor_is_admin, target_id)?;
        let patch = match kind {
            PictureKind::Profile => UserPatch {
                profile_picture: Some(path),
                ..UserPatch::default()
            },
            PictureKind::Cover => UserPatch {
                cover_picture: Some(path),
                ..UserPatch::default()
            },
        };
        self.repo
            .update_user(target_id, patch)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {target_id}")))
    }
}

fn authorize_self_or_admin(
    actor_id: i64,
    actor_is_admin: bool,
    target_id: i64,
) -> Result<(), DomainError> {
    if actor_id != target_id && !actor_is_admin {
        return Err(DomainError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PictureKind, UserService};
    use crate::application::test_support::{FakeUserRepo, sample_user};
    use crate::domain::error::DomainError;
    use crate::domain::user::{UpdateUserRequest, UserStatus};

    #[tokio::test]
    async fn update_is_forbidden_for_unrelated_user() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo);

        let req = UpdateUserRequest {
            city: Some("Berlin".to_string()),
            ..UpdateUserRequest::default()
        };
        let err = service
            .update_profile(2, false, 1, req)
            .await
            .expect_err("must be forbidden");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn admin_may_update_any_profile() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo.clone());

        let req = UpdateUserRequest {
            description: Some("hello".to_string()),
            ..UpdateUserRequest::default()
        };
        let updated = service
            .update_profile(99, true, 1, req)
            .await
            .expect("admin update must succeed");
        assert_eq!(updated.description, "hello");
    }

    #[tokio::test]
    async fn password_update_is_rehashed() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo.clone());

        let req = UpdateUserRequest {
            password: Some("new-password".to_string()),
            ..UpdateUserRequest::default()
        };
        service
            .update_profile(1, false, 1, req)
            .await
            .expect("update must succeed");

        let (id, patch) = repo.take_patch().expect("patch must be captured");
        assert_eq!(id, 1);
        let hash = patch.password_hash.expect("password_hash must be set");
        assert_ne!(hash, "new-password");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn role_edit_requires_admin() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo);

        let req = UpdateUserRequest {
            is_admin: Some(true),
            ..UpdateUserRequest::default()
        };
        let err = service
            .update_profile(1, false, 1, req)
            .await
            .expect_err("self-promotion must be forbidden");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn follow_rejects_self_and_duplicates() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        repo.insert(sample_user(2, "bob"));
        let service = UserService::new(repo.clone());

        let err = service.follow(1, 1).await.expect_err("self-follow");
        assert!(matches!(err, DomainError::Forbidden));

        service.follow(1, 2).await.expect("first follow succeeds");
        let err = service.follow(1, 2).await.expect_err("second follow");
        assert!(matches!(err, DomainError::Forbidden));

        let bob = repo.get(2).expect("bob exists");
        assert_eq!(bob.followers, vec![1]);
        let alice = repo.get(1).expect("alice exists");
        assert_eq!(alice.followings, vec![2]);
    }

    #[tokio::test]
    async fn unfollow_requires_existing_link() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        repo.insert(sample_user(2, "bob"));
        let service = UserService::new(repo.clone());

        let err = service.unfollow(1, 2).await.expect_err("not following");
        assert!(matches!(err, DomainError::Forbidden));

        service.follow(1, 2).await.expect("follow succeeds");
        service.unfollow(1, 2).await.expect("unfollow succeeds");
        assert!(repo.get(2).expect("bob exists").followers.is_empty());
    }

    #[tokio::test]
    async fn delete_requires_self_or_admin() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo.clone());

        let err = service
            .delete_account(2, false, 1)
            .await
            .expect_err("must be forbidden");
        assert!(matches!(err, DomainError::Forbidden));

        service
            .delete_account(2, true, 1)
            .await
            .expect("admin delete succeeds");
        assert!(repo.get(1).is_none());
    }

    #[tokio::test]
    async fn listing_is_admin_only() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo);

        let err = service
            .list_users(false, None)
            .await
            .expect_err("must be forbidden");
        assert!(matches!(err, DomainError::Forbidden));

        let users = service.list_users(true, None).await.expect("admin lists");
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn toggle_status_flips_between_states() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo);

        let status = service.toggle_status(true, 1).await.expect("toggle");
        assert_eq!(status, UserStatus::Inactive);
        let status = service.toggle_status(true, 1).await.expect("toggle back");
        assert_eq!(status, UserStatus::Active);

        let err = service
            .toggle_status(true, 42)
            .await
            .expect_err("missing user");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn require_active_rejects_inactive_and_missing() {
        let repo = FakeUserRepo::new();
        let mut user = sample_user(1, "alice");
        user.status = UserStatus::Inactive;
        repo.insert(user);
        let service = UserService::new(repo);

        assert!(matches!(
            service.require_active(1).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            service.require_active(2).await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn picture_upload_patches_the_right_column() {
        let repo = FakeUserRepo::new();
        repo.insert(sample_user(1, "alice"));
        let service = UserService::new(repo.clone());

        let user = service
            .set_picture(1, false, 1, PictureKind::Cover, "/uploads/c.png".to_string())
            .await
            .expect("upload must succeed");
        assert_eq!(user.cover_picture, "/uploads/c.png");
        assert!(user.profile_picture.is_empty());
    }
}
