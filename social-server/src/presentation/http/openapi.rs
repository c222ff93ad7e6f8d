use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::http::handlers::auth::{AuthResponseDto, LoginDto, RegisterDto, UserDto};
use crate::presentation::http::handlers::posts::{
    CommentDto, CreateCommentDto, LikeDto, PostDto, SearchPostsQuery,
};
use crate::presentation::http::handlers::users::{
    ListUsersQuery, MessageDto, SearchUserDto, SearchUsersQuery, StatusDto, UpdateUserDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::auth::register,
        crate::presentation::http::handlers::auth::login,
        crate::presentation::http::handlers::users::get_user,
        crate::presentation::http::handlers::users::update_user,
        crate::presentation::http::handlers::users::delete_user,
        crate::presentation::http::handlers::users::follow_user,
        crate::presentation::http::handlers::users::unfollow_user,
        crate::presentation::http::handlers::users::search_users,
        crate::presentation::http::handlers::users::list_users,
        crate::presentation::http::handlers::users::toggle_user_status,
        crate::presentation::http::handlers::users::upload_profile_picture,
        crate::presentation::http::handlers::users::upload_cover_picture,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::list_all_posts,
        crate::presentation::http::handlers::posts::update_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::posts::toggle_like,
        crate::presentation::http::handlers::posts::timeline,
        crate::presentation::http::handlers::posts::posts_by_user,
        crate::presentation::http::handlers::posts::search_posts,
        crate::presentation::http::handlers::posts::add_comment,
        crate::presentation::http::handlers::posts::list_comments,
        crate::presentation::http::handlers::posts::delete_comment
    ),
    components(
        schemas(
            RegisterDto,
            LoginDto,
            AuthResponseDto,
            UserDto,
            UpdateUserDto,
            SearchUsersQuery,
            ListUsersQuery,
            SearchUserDto,
            MessageDto,
            StatusDto,
            PostDto,
            CommentDto,
            CreateCommentDto,
            LikeDto,
            SearchPostsQuery
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Profiles, follow graph and moderation"),
        (name = "posts", description = "Posts, likes, comments and search")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
