use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::helpers::{self, token};
use crate::models::user::CurrentUser;
use crate::services::users::UserService;
use crate::state::AppState;

/// Bearer-token gate. Verifies the token, resolves it to a live user row,
/// and attaches a `CurrentUser` extension; rejects with 401 otherwise.
pub async fn require_user(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return helpers::fail(StatusCode::UNAUTHORIZED, "Access denied. No token provided.");
    };

    let claims = match token::verify(bearer.token(), &state.cfg.token_secret) {
        Ok(claims) => claims,
        Err(_) => return helpers::fail(StatusCode::UNAUTHORIZED, "Invalid or expired token."),
    };

    let user = match state.users.find_by_id(claims.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return helpers::fail(StatusCode::UNAUTHORIZED, "User not found."),
        Err(err) => {
            tracing::error!(%err, "user lookup during authentication failed");
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error.",
                &err.to_string(),
            );
        }
    };

    req.extensions_mut().insert(CurrentUser::from(user));
    next.run(req).await
}
