use std::sync::Arc;

use tera::Tera;

use crate::config::AppCfg;
use crate::email::Mailer;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::authors::AuthorServiceDb;
use crate::services::posts::PostServiceDb;
use crate::services::users::UserServiceDb;

/// Process-scoped dependencies handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AppCfg>,
    pub authors: AuthorServiceDb,
    pub posts: PostServiceDb,
    pub users: UserServiceDb,
    pub tera: Arc<Tera>,
    pub mailer: Option<Arc<Mailer>>,
    pub api_limiter: Arc<RateLimiter>,
    pub auth_limiter: Arc<RateLimiter>,
}
