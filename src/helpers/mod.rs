pub mod password;
pub mod token;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// `{status, message, data}` success envelope used by the auth endpoints.
pub fn success<T: Serialize>(code: StatusCode, message: &str, data: T) -> Response {
    (
        code,
        Json(json!({ "status": "success", "message": message, "data": data })),
    )
        .into_response()
}

pub fn success_message(code: StatusCode, message: &str) -> Response {
    (
        code,
        Json(json!({ "status": "success", "message": message })),
    )
        .into_response()
}

pub fn fail(code: StatusCode, message: &str) -> Response {
    (
        code,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

pub fn fail_with(code: StatusCode, message: &str, errors: &str) -> Response {
    (
        code,
        Json(json!({ "status": "error", "message": message, "errors": errors })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_status_codes() {
        assert_eq!(
            success_message(StatusCode::OK, "Logout successful").status(),
            StatusCode::OK
        );
        assert_eq!(
            fail(StatusCode::UNAUTHORIZED, "Invalid credentials").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            fail_with(StatusCode::INTERNAL_SERVER_ERROR, "Login failed", "boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
