use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::application::user_service::UserService;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::uploads::UploadStore;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService<PostgresUserRepository>>,
    pub(crate) user_service: Arc<UserService<PostgresUserRepository>>,
    pub(crate) post_service: Arc<PostService<PostgresPostRepository, PostgresUserRepository>>,
    pub(crate) jwt: Arc<JwtService>,
    pub(crate) uploads: UploadStore,
}

impl AppState {
    pub(crate) fn new(
        auth_service: Arc<AuthService<PostgresUserRepository>>,
        user_service: Arc<UserService<PostgresUserRepository>>,
        post_service: Arc<PostService<PostgresPostRepository, PostgresUserRepository>>,
        jwt: Arc<JwtService>,
        uploads: UploadStore,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            post_service,
            jwt,
            uploads,
        }
    }
}
