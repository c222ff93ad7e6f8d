use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};

use crate::data::user_repository::{NewUser, UserCredentials, UserPatch, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{User, UserStatus};

const USER_COLUMNS: &str = "id, username, email, status, is_admin, profile_picture, \
     cover_picture, description, city, home_town, relationship, followers, followings, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    status: String,
    is_admin: bool,
    profile_picture: String,
    cover_picture: String,
    description: String,
    city: String,
    home_town: String,
    relationship: String,
    followers: Vec<i64>,
    followings: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, DomainError> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            status: UserStatus::parse(&self.status)
                .map_err(|err| DomainError::Unexpected(err.to_string()))?,
            is_admin: self.is_admin,
            profile_picture: self.profile_picture,
            cover_picture: self.cover_picture,
            description: self.description,
            city: self.city,
            home_town: self.home_town,
            relationship: self.relationship,
            followers: self.followers,
            followings: self.followings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.into_user()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_credentials(
        &self,
        identifier: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users \
             WHERE username = $1 OR email = $1"
        );
        let row = sqlx::query_as::<_, CredentialsRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(|r| {
            Ok(UserCredentials {
                user: r.user.into_user()?,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, DomainError> {
        let mut builder = QueryBuilder::new("UPDATE users SET updated_at = NOW()");
        push_set(&mut builder, "username", patch.username);
        push_set(&mut builder, "email", patch.email);
        push_set(&mut builder, "password_hash", patch.password_hash);
        push_set(&mut builder, "description", patch.description);
        push_set(&mut builder, "city", patch.city);
        push_set(&mut builder, "home_town", patch.home_town);
        push_set(&mut builder, "relationship", patch.relationship);
        push_set(&mut builder, "profile_picture", patch.profile_picture);
        push_set(&mut builder, "cover_picture", patch.cover_picture);
        push_set(
            &mut builder,
            "status",
            patch.status.map(|status| status.as_str().to_string()),
        );
        if let Some(is_admin) = patch.is_admin {
            builder.push(", is_admin = ");
            builder.push_bind(is_admin);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, limit: Option<i64>) -> Result<Vec<User>, DomainError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"));
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows = builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn search_by_username(&self, query: &str) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE username ILIKE $1 \
             ORDER BY username ASC"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(format!("%{}%", escape_like(query)))
            .fetch_all(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn follow(&self, target_id: i64, follower_id: i64) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_user_db_error)?;

        let already: bool = match sqlx::query_scalar::<_, bool>(
            "SELECT $2 = ANY(followers) FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(target_id)
        .bind(follower_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_user_db_error)?
        {
            Some(already) => already,
            None => return Err(DomainError::NotFound(format!("user id: {target_id}"))),
        };
        if already {
            return Ok(false);
        }

        let follower_exists = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(follower_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_user_db_error)?;
        if follower_exists.is_none() {
            return Err(DomainError::NotFound(format!("user id: {follower_id}")));
        }

        sqlx::query(
            "UPDATE users SET followers = array_append(followers, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(target_id)
        .bind(follower_id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        sqlx::query(
            "UPDATE users SET followings = array_append(followings, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(follower_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        tx.commit().await.map_err(map_user_db_error)?;
        Ok(true)
    }

    async fn unfollow(&self, target_id: i64, follower_id: i64) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_user_db_error)?;

        let following: bool = match sqlx::query_scalar::<_, bool>(
            "SELECT $2 = ANY(followers) FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(target_id)
        .bind(follower_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_user_db_error)?
        {
            Some(following) => following,
            None => return Err(DomainError::NotFound(format!("user id: {target_id}"))),
        };
        if !following {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET followers = array_remove(followers, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(target_id)
        .bind(follower_id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        sqlx::query(
            "UPDATE users SET followings = array_remove(followings, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(follower_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .map_err(map_user_db_error)?;

        tx.commit().await.map_err(map_user_db_error)?;
        Ok(true)
    }

    async fn toggle_status(&self, id: i64) -> Result<Option<UserStatus>, DomainError> {
        let status = sqlx::query_scalar::<_, String>(
            "UPDATE users \
             SET status = CASE WHEN status = 'active' THEN 'inactive' ELSE 'active' END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING status",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        status
            .map(|value| {
                UserStatus::parse(&value).map_err(|err| DomainError::Unexpected(err.to_string()))
            })
            .transpose()
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

fn push_set(
    builder: &mut QueryBuilder<'_, sqlx::Postgres>,
    column: &str,
    value: Option<String>,
) {
    if let Some(value) = value {
        builder.push(format!(", {column} = "));
        builder.push_bind(value);
    }
}

pub(crate) fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        let resource = match db_err.constraint() {
            Some("users_username_key") => "username",
            Some("users_email_key") => "email",
            _ => "user",
        };
        return DomainError::AlreadyExists(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("al_ice%"), "al\\_ice\\%");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
