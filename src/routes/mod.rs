pub mod auth;
pub mod authors;
pub mod blog;
pub mod views;

use axum::Router;

use crate::state::AppState;

/// The `/api` surface: blog and author CRUD.
pub fn api_router() -> Router<AppState> {
    blog::router().merge(authors::router())
}
