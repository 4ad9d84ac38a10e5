use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::StoreError;
use crate::helpers::{self, password, token};
use crate::middleware::{auth, rate_limit};
use crate::models::user::{CurrentUser, NewUser, RegisteredUser};
use crate::services::users::UserService;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(from_fn_with_state(
            state.clone(),
            rate_limit::per_client_auth,
        ));
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/profile", get(profile))
        .route_layer(from_fn_with_state(state.clone(), auth::require_user));
    public.merge(protected)
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    name: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

fn validate_registration(body: &RegisterBody) -> Result<(), &'static str> {
    if !body.email.contains('@') {
        return Err("A valid email is required");
    }
    if body.password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if body.name.trim().is_empty() {
        return Err("Name is required");
    }
    Ok(())
}

async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> Response {
    if let Err(message) = validate_registration(&body) {
        return helpers::fail(StatusCode::BAD_REQUEST, message);
    }

    match state.users.find_by_email(&body.email).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            return helpers::fail(StatusCode::BAD_REQUEST, "Email already registered");
        }
        Err(err) => {
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed",
                &err.to_string(),
            );
        }
    }

    let hashed = match password::hash(&body.password) {
        Ok(hashed) => hashed,
        Err(err) => {
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed",
                &err.to_string(),
            );
        }
    };

    let new_user = NewUser {
        email: body.email,
        password: hashed,
        name: body.name,
    };
    let user = match state.users.create(&new_user).await {
        Ok(user) => user,
        // the unique index backs up the pre-check under concurrent registration
        Err(StoreError::Duplicate) => {
            return helpers::fail(StatusCode::BAD_REQUEST, "Email already registered");
        }
        Err(err) => {
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed",
                &err.to_string(),
            );
        }
    };

    let token = match token::issue(
        user.id,
        &user.email,
        &state.cfg.token_secret,
        state.cfg.token_ttl(),
    ) {
        Ok(token) => token,
        Err(err) => {
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed",
                &err.to_string(),
            );
        }
    };

    if let Some(mailer) = &state.mailer {
        let html = format!(
            "<h1>Welcome {}!</h1><p>Thank you for registering with us.</p>",
            user.name
        );
        mailer.send(&user.email, "Welcome to Our Platform", html).await;
    } else {
        tracing::info!("email not configured, skipping welcome mail");
    }

    helpers::success(
        StatusCode::CREATED,
        "Registration successful",
        json!({ "user": RegisteredUser::from(user), "token": token }),
    )
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    let user = match state.users.find_by_email(&body.email).await {
        Ok(Some(user)) => user,
        Ok(None) => return helpers::fail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
        Err(err) => {
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed",
                &err.to_string(),
            );
        }
    };

    if !password::verify(&body.password, &user.password) {
        return helpers::fail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let token = match token::issue(
        user.id,
        &user.email,
        &state.cfg.token_secret,
        state.cfg.token_ttl(),
    ) {
        Ok(token) => token,
        Err(err) => {
            return helpers::fail_with(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed",
                &err.to_string(),
            );
        }
    };

    helpers::success(
        StatusCode::OK,
        "Login successful",
        json!({ "user": CurrentUser::from(user), "token": token }),
    )
}

// Tokens are not tracked server side; logout is the client dropping its copy.
async fn logout() -> Response {
    helpers::success_message(
        StatusCode::OK,
        "Logout successful. Please delete the token on client side.",
    )
}

async fn profile(Extension(user): Extension<CurrentUser>) -> Response {
    helpers::success(
        StatusCode::OK,
        "Profile retrieved successfully",
        json!({ "user": user }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(email: &str, password: &str, name: &str) -> RegisterBody {
        RegisterBody {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn registration_validation() {
        assert!(validate_registration(&body("a@x.com", "longenough", "A")).is_ok());
        assert!(validate_registration(&body("not-an-email", "longenough", "A")).is_err());
        assert!(validate_registration(&body("a@x.com", "short", "A")).is_err());
        assert!(validate_registration(&body("a@x.com", "longenough", "  ")).is_err());
    }
}
