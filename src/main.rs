mod config;
mod email;
mod error;
mod helpers;
mod middleware;
mod models;
mod routes;
mod schema;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::Router;

use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

use figment::{providers::Format, Figment};

use config::AppCfg;
use email::Mailer;
use middleware::rate_limit::{self, RateLimiter};
use services::authors::AuthorServiceDb;
use services::posts::PostServiceDb;
use services::users::UserServiceDb;
use state::AppState;
use tera::Tera;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::*;
use tracing_forest::ForestLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::middleware::logging::HttpLoggingExt;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: AppCfg = Figment::new()
        .merge(figment::providers::Json::file("appsettings.json"))
        .merge(figment::providers::Env::prefixed("APP_").split("__"))
        .extract()?;

    // initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(ForestLayer::default())
        .init();

    run_migrations(&cfg.database_url).await?;

    info!("Starting DB pool");
    let mgr =
        AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new(&cfg.database_url);
    let pool = Pool::builder(mgr)
        .max_size(10)
        .runtime(deadpool::Runtime::Tokio1)
        .build()?;

    tokio::fs::create_dir_all(&cfg.upload_dir).await?;

    let tera = Tera::new("templates/**/*.html")?;
    let mailer = Mailer::from_cfg(&cfg.email)?.map(Arc::new);

    let state = AppState {
        authors: AuthorServiceDb::new(pool.clone()),
        posts: PostServiceDb::new(pool.clone()),
        users: UserServiceDb::new(pool),
        tera: Arc::new(tera),
        mailer,
        api_limiter: Arc::new(RateLimiter::new(
            rate_limit::GENERAL_MAX_REQUESTS,
            rate_limit::WINDOW,
        )),
        auth_limiter: Arc::new(RateLimiter::new(
            rate_limit::AUTH_MAX_REQUESTS,
            rate_limit::WINDOW,
        )),
        cfg: Arc::new(cfg),
    };

    let app = Router::new()
        .nest("/api/auth", routes::auth::router(&state))
        .nest("/api", routes::api_router())
        .nest("/blog-view", routes::views::router())
        .nest_service(
            "/uploads",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    header::HeaderValue::from_static("max-age=86400"),
                ))
                .layer(CompressionLayer::new())
                .service(tower_http::services::ServeDir::new(&state.cfg.upload_dir)),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::per_client,
        ))
        .with_state(state.clone())
        .with_http_logging();

    let addr = format!("0.0.0.0:{}", state.cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("starting listening at {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    use diesel::Connection;
    use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
    use diesel_migrations::MigrationHarness;

    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn: AsyncConnectionWrapper<diesel_async::AsyncPgConnection> =
            AsyncConnectionWrapper::establish(&url)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow::anyhow!("running migrations: {err}"))?;
        anyhow::Ok(())
    })
    .await??;
    Ok(())
}
