use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};

use crate::data::post_repository::{NewComment, NewPost, PostPatch, PostRepository, PostSearch};
use crate::domain::error::DomainError;
use crate::domain::post::{Comment, Post, PostSort};

use super::user_repository::escape_like;

const POST_COLUMNS: &str =
    "id, author_id, title, description, image, category, likes, created_at, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    title: String,
    description: String,
    image: Option<String>,
    category: String,
    likes: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            description: row.description,
            image: row.image,
            category: row.category,
            likes: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    username: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            username: row.username,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            "INSERT INTO posts (author_id, title, description, category, image) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(input.author_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.image)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(row.into())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(row.map(Post::from))
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut builder = QueryBuilder::new("UPDATE posts SET updated_at = NOW()");
        if let Some(title) = patch.title {
            builder.push(", title = ");
            builder.push_bind(title);
        }
        if let Some(description) = patch.description {
            builder.push(", description = ");
            builder.push_bind(description);
        }
        if let Some(category) = patch.category {
            builder.push(", category = ");
            builder.push_bind(category);
        }
        if let Some(image) = patch.image {
            builder.push(", image = ");
            builder.push_bind(image);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {POST_COLUMNS}"));

        let row = builder
            .build_query_as::<PostRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id ASC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_by_authors(&self, author_ids: &[i64]) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE author_id = ANY($1) \
             ORDER BY array_position($1, author_id), id ASC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(author_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn toggle_like(&self, post_id: i64, user_id: i64) -> Result<Option<bool>, DomainError> {
        // Single statement so concurrent toggles cannot interleave between a
        // read and a write.
        let liked = sqlx::query_scalar::<_, bool>(
            "UPDATE posts \
             SET likes = CASE \
                 WHEN $2 = ANY(likes) THEN array_remove(likes, $2) \
                 ELSE array_append(likes, $2) \
             END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING $2 = ANY(likes)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(liked)
    }

    async fn search(&self, search: PostSearch) -> Result<Vec<Post>, DomainError> {
        let mut builder = QueryBuilder::new(
            "SELECT p.id, p.author_id, p.title, p.description, p.image, p.category, \
             p.likes, p.created_at, p.updated_at \
             FROM posts p \
             LEFT JOIN users u ON u.id = p.author_id \
             WHERE p.author_id = ANY(",
        );
        builder.push_bind(search.author_ids);
        builder.push(")");

        if let Some(query) = search.query.filter(|query| !query.is_empty()) {
            let pattern = format!("%{}%", escape_like(&query));
            builder.push(" AND (p.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR p.description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR p.category ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(match search.sort {
            PostSort::Title => " ORDER BY p.title ASC, p.id ASC",
            PostSort::Date => " ORDER BY p.created_at DESC, p.id DESC",
            PostSort::Username => " ORDER BY u.username ASC NULLS LAST, p.id ASC",
        });

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn add_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "INSERT INTO comments (post_id, author_id, username, text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, post_id, author_id, username, text, created_at",
        )
        .bind(input.post_id)
        .bind(input.author_id)
        .bind(&input.username)
        .bind(&input.text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(row.into())
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_id, username, text, created_at \
             FROM comments \
             WHERE post_id = $1 \
             ORDER BY id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>, DomainError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_id, username, text, created_at \
             FROM comments \
             WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23503")
    {
        return DomainError::NotFound("post".to_string());
    }
    DomainError::Unexpected(err.to_string())
}
