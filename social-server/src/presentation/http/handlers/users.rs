use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::user_service::PictureKind;
use crate::domain::user::{UpdateUserRequest, User, UserStatus};
use crate::infrastructure::uploads::UploadStore;
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppError, AppResult};
use crate::presentation::http::middleware::auth::AuthenticatedUser;

use super::auth::UserDto;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateUserDto {
    #[validate(length(min = 3, max = 20))]
    pub(crate) username: Option<String>,
    #[validate(email, length(max = 50))]
    pub(crate) email: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub(crate) password: Option<String>,
    #[validate(length(max = 80))]
    pub(crate) description: Option<String>,
    #[validate(length(max = 50))]
    pub(crate) city: Option<String>,
    #[validate(length(max = 50))]
    pub(crate) home_town: Option<String>,
    pub(crate) relationship: Option<String>,
    pub(crate) profile_picture: Option<String>,
    pub(crate) cover_picture: Option<String>,
    /// `active` or `inactive`; admin only.
    pub(crate) status: Option<String>,
    /// Admin only.
    pub(crate) is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct SearchUsersQuery {
    #[validate(length(min = 1, max = 50))]
    pub(crate) query: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ListUsersQuery {
    #[validate(range(min = 1, max = 1000))]
    pub(crate) limit: Option<i64>,
}

/// Search results carry no account identifier.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SearchUserDto {
    pub(crate) username: String,
    pub(crate) profile_picture: String,
    pub(crate) description: String,
    pub(crate) city: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<User> for SearchUserDto {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            profile_picture: user.profile_picture,
            description: user.description,
            city: user.city,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageDto {
    pub(crate) message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct StatusDto {
    pub(crate) status: String,
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile found", body = UserDto),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let user = state.user_service.get_profile(id).await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Profile updated", body = UserDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(dto): Json<UpdateUserDto>,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    dto.validate()?;

    let status = dto
        .status
        .as_deref()
        .map(UserStatus::parse)
        .transpose()
        .map_err(AppError::Domain)?;
    let req = UpdateUserRequest {
        username: dto.username,
        email: dto.email,
        password: dto.password,
        description: dto.description,
        city: dto.city,
        home_town: dto.home_town,
        relationship: dto.relationship,
        profile_picture: dto.profile_picture,
        cover_picture: dto.cover_picture,
        status,
        is_admin: dto.is_admin,
    };

    let user = state
        .user_service
        .update_profile(auth.user_id, auth.is_admin, id, req)
        .await?;
    Ok((StatusCode::OK, Json(user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .user_service
        .delete_account(auth.user_id, auth.is_admin, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/follow",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id to follow")),
    responses(
        (status = 200, description = "Now following", body = MessageDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Self-follow or already following"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn follow_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<MessageDto>)> {
    state.user_service.follow(auth.user_id, id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageDto {
            message: "user has been followed".to_string(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/unfollow",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id to unfollow")),
    responses(
        (status = 200, description = "No longer following", body = MessageDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Self-unfollow or not following"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn unfollow_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<MessageDto>)> {
    state.user_service.unfollow(auth.user_id, id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageDto {
            message: "user has been unfollowed".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("query" = String, Query, description = "Username substring, case-insensitive")),
    responses(
        (status = 200, description = "Matching users", body = [SearchUserDto]),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn search_users(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Query(query): Query<SearchUsersQuery>,
) -> AppResult<(StatusCode, Json<Vec<SearchUserDto>>)> {
    query.validate()?;
    let users = state.user_service.search(&query.query).await?;
    Ok((
        StatusCode::OK,
        Json(users.into_iter().map(SearchUserDto::from).collect()),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("limit" = Option<i64>, Query, description = "Cap on returned users, newest first")),
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<(StatusCode, Json<Vec<UserDto>>)> {
    query.validate()?;
    let users = state
        .user_service
        .list_users(auth.is_admin, query.limit)
        .await?;
    Ok((
        StatusCode::OK,
        Json(users.into_iter().map(UserDto::from).collect()),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/toggle-status",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Status toggled", body = StatusDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn toggle_user_status(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<StatusDto>)> {
    let status = state.user_service.toggle_status(auth.is_admin, id).await?;
    Ok((
        StatusCode::OK,
        Json(StatusDto {
            status: status.as_str().to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/profile-picture",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = UserDto),
        (status = 400, description = "Missing or invalid image"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn upload_profile_picture(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    upload_picture(state, auth, id, PictureKind::Profile, multipart).await
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/cover-picture",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = UserDto),
        (status = 400, description = "Missing or invalid image"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn upload_cover_picture(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    upload_picture(state, auth, id, PictureKind::Cover, multipart).await
}

async fn upload_picture(
    state: AppState,
    auth: AuthenticatedUser,
    target_id: i64,
    kind: PictureKind,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UserDto>)> {
    let path = read_image_field(multipart, &state.uploads)
        .await?
        .ok_or_else(|| AppError::BadRequest("an 'image' field is required".to_string()))?;

    let user = state
        .user_service
        .set_picture(auth.user_id, auth.is_admin, target_id, kind, path)
        .await?;
    Ok((StatusCode::OK, Json(user.into())))
}

/// Extracts and stores the `image` part of a multipart body, if present.
async fn read_image_field(
    mut multipart: Multipart,
    uploads: &UploadStore,
) -> AppResult<Option<String>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().map(str::to_string);
        if name.as_deref() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?;

        let path = uploads
            .save(&filename, content_type.as_deref(), &bytes)
            .await?;
        return Ok(Some(path));
    }

    Ok(None)
}
