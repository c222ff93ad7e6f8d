use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};

use crate::presentation::AppState;
use crate::presentation::http::handlers::users::{
    delete_user, follow_user, get_user, list_users, search_users, toggle_user_status,
    unfollow_user, update_user, upload_cover_picture, upload_profile_picture,
};
use crate::presentation::http::middleware::auth::jwt_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/{id}", get(get_user));

    let protected = Router::new()
        .route("/", get(list_users))
        .route("/search", get(search_users))
        .route("/{id}", put(update_user).delete(delete_user))
        .route("/{id}/follow", put(follow_user))
        .route("/{id}/unfollow", put(unfollow_user))
        .route("/{id}/toggle-status", put(toggle_user_status))
        .route("/{id}/profile-picture", post(upload_profile_picture))
        .route("/{id}/cover-picture", post(upload_cover_picture))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    public.merge(protected)
}
