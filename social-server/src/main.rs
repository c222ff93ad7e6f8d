use std::sync::Arc;

use anyhow::Result;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use application::post_service::PostService;
use application::user_service::UserService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use infrastructure::uploads::UploadStore;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url).await?;
    run_migrations(&pool).await?;

    let uploads = UploadStore::new(&settings.uploads_dir);
    uploads.ensure_dir().await?;

    let user_repo = PostgresUserRepository::new(pool.clone());
    let post_repo = PostgresPostRepository::new(pool);

    let jwt = JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds);

    let auth_service = Arc::new(AuthService::new(user_repo.clone(), jwt.clone()));
    let user_service = Arc::new(UserService::new(user_repo.clone()));
    let post_service = Arc::new(PostService::new(post_repo, user_repo));

    let state = AppState::new(auth_service, user_service, post_service, Arc::new(jwt), uploads);

    server::run_http(&settings, state).await
}
