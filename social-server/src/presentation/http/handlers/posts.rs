use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::post::{
    Comment, CommentRequest, CreatePostRequest, Post, PostSort, SearchFilter, UpdatePostRequest,
};
use crate::infrastructure::uploads::UploadStore;
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppResult};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) author_id: i64,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) image: Option<String>,
    pub(crate) category: String,
    pub(crate) likes: Vec<i64>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            description: post.description,
            image: post.image,
            category: post.category,
            likes: post.likes,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) post_id: i64,
    pub(crate) author_id: i64,
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            username: comment.username,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateCommentDto {
    #[validate(length(min = 1, max = 500))]
    pub(crate) text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LikeDto {
    /// Whether the caller likes the post after the toggle.
    pub(crate) liked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SearchPostsQuery {
    pub(crate) query: Option<String>,
    /// `only-my-posts`, `exclude-my-posts`, or absent for caller + followed.
    pub(crate) filter: Option<String>,
    /// `title` (default), `date`, or `username`.
    pub(crate) sort: Option<String>,
}

/// Text fields plus the stored image path from a `multipart/form-data` post
/// body. Absent fields stay `None`.
#[derive(Debug, Default)]
struct PostForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    image: Option<String>,
}

async fn read_post_form(mut multipart: Multipart, uploads: &UploadStore) -> AppResult<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => form.title = Some(read_text(field).await?),
            Some("description") => form.description = Some(read_text(field).await?),
            Some("category") => form.category = Some(read_text(field).await?),
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?;
                form.image = Some(uploads.save(&filename, content_type.as_deref(), &bytes).await?);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))
}

#[utoipa::path(
    post,
    path = "/api/post",
    tag = "posts",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Missing title or category"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let form = read_post_form(multipart, &state.uploads).await?;

    // Missing fields fall through as empty strings and fail validation.
    let req = CreatePostRequest {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        category: form.category.unwrap_or_default(),
        image: form.image,
    };

    let post = state.post_service.create_post(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[utoipa::path(
    get,
    path = "/api/post/all",
    tag = "posts",
    responses(
        (status = 200, description = "Every post", body = [PostDto]),
        (status = 404, description = "No posts yet"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_all_posts(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let posts = state.post_service.list_all().await?;
    Ok((
        StatusCode::OK,
        Json(posts.into_iter().map(PostDto::from).collect()),
    ))
}

#[utoipa::path(
    put,
    path = "/api/post/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = PostDto),
        (status = 400, description = "Empty title or category"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your post"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let form = read_post_form(multipart, &state.uploads).await?;

    let req = UpdatePostRequest {
        title: form.title,
        description: form.description,
        category: form.category,
        image: form.image,
    };

    let post = state.post_service.update_post(auth.user_id, id, req).await?;
    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    delete,
    path = "/api/post/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Owner or admin only"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .post_service
        .delete_post(auth.user_id, auth.is_admin, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/post/{id}/like",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Like toggled", body = LikeDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<LikeDto>)> {
    let liked = state.post_service.toggle_like(auth.user_id, id).await?;
    Ok((StatusCode::OK, Json(LikeDto { liked })))
}

#[utoipa::path(
    get,
    path = "/api/post/timeline/all",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own posts followed by followed users' posts", body = [PostDto]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn timeline(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let posts = state.post_service.timeline(auth.user_id).await?;
    Ok((
        StatusCode::OK,
        Json(posts.into_iter().map(PostDto::from).collect()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/post/user/{user_id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("user_id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Posts by this author", body = [PostDto]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No posts for this author"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn posts_by_user(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(user_id): Path<i64>,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let posts = state.post_service.posts_by_user(user_id).await?;
    Ok((
        StatusCode::OK,
        Json(posts.into_iter().map(PostDto::from).collect()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/post/search",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(
        ("query" = Option<String>, Query, description = "Substring over title/description/category"),
        ("filter" = Option<String>, Query, description = "only-my-posts | exclude-my-posts"),
        ("sort" = Option<String>, Query, description = "title | date | username")
    ),
    responses(
        (status = 200, description = "Matching posts", body = [PostDto]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn search_posts(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<SearchPostsQuery>,
) -> AppResult<(StatusCode, Json<Vec<PostDto>>)> {
    let filter = SearchFilter::parse(query.filter.as_deref());
    let sort = PostSort::parse(query.sort.as_deref());

    let posts = state
        .post_service
        .search(auth.user_id, query.query, filter, sort)
        .await?;
    Ok((
        StatusCode::OK,
        Json(posts.into_iter().map(PostDto::from).collect()),
    ))
}

#[utoipa::path(
    post,
    path = "/api/post/{id}/comment",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment added", body = CommentDto),
        (status = 400, description = "Empty comment text"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(dto): Json<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;

    let comment = state
        .post_service
        .add_comment(auth.user_id, &auth.username, id, CommentRequest { text: dto.text })
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[utoipa::path(
    get,
    path = "/api/post/{id}/comments",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Comments in insertion order", body = [CommentDto]),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<Vec<CommentDto>>)> {
    let comments = state.post_service.list_comments(id).await?;
    Ok((
        StatusCode::OK,
        Json(comments.into_iter().map(CommentDto::from).collect()),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/post/{id}/comment/{comment_id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the commenter may delete"),
        (status = 404, description = "Post or comment not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((id, comment_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .post_service
        .delete_comment(auth.user_id, id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
