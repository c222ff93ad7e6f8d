use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};

use crate::presentation::AppState;
use crate::presentation::http::handlers::posts::{
    add_comment, create_post, delete_comment, delete_post, list_all_posts, list_comments,
    posts_by_user, search_posts, timeline, toggle_like, update_post,
};
use crate::presentation::http::middleware::auth::jwt_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/all", get(list_all_posts))
        .route("/{id}/comments", get(list_comments));

    let protected = Router::new()
        .route("/", post(create_post))
        .route("/search", get(search_posts))
        .route("/timeline/all", get(timeline))
        .route("/user/{user_id}", get(posts_by_user))
        .route("/{id}", put(update_post).delete(delete_post))
        .route("/{id}/like", put(toggle_like))
        .route("/{id}/comment", post(add_comment))
        .route("/{id}/comment/{comment_id}", delete(delete_comment))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    public.merge(protected)
}
