use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{AppError, StoreError};
use crate::models::author::{AuthorFields, AuthorWithPosts};
use crate::services::authors::AuthorService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/authors", get(list_authors).post(create_author))
        .route("/authors/:id", put(update_author).delete(delete_author))
}

async fn list_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuthorWithPosts>>, AppError> {
    let authors = state
        .authors
        .list_with_posts()
        .await
        .map_err(|err| AppError::internal("Failed to fetch authors", err))?;
    Ok(Json(authors))
}

async fn create_author(
    State(state): State<AppState>,
    Json(fields): Json<AuthorFields>,
) -> Result<Json<Value>, AppError> {
    match state.authors.create(&fields).await {
        Ok(created) => Ok(Json(
            json!({ "message": "Author created successfully!", "createdAuthor": created }),
        )),
        Err(StoreError::Duplicate) => {
            Err(AppError::Conflict("Email or phone number already exists"))
        }
        Err(err) => Err(AppError::internal("Failed to create author", err)),
    }
}

async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(fields): Json<AuthorFields>,
) -> Result<Json<Value>, AppError> {
    match state.authors.update(id, &fields).await {
        Ok(updated) => Ok(Json(
            json!({ "message": "Author updated successfully!", "updated": updated }),
        )),
        Err(StoreError::NotFound) => Err(AppError::NotFound("Author not found")),
        Err(StoreError::Duplicate) => {
            Err(AppError::Conflict("Email or phone number already exists"))
        }
        Err(err) => Err(AppError::internal("Failed to update author", err)),
    }
}

async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    // Deleting an author that still owns posts trips the foreign key and
    // surfaces as an unclassified failure; cascade-vs-block is an open
    // product decision.
    match state.authors.delete(id).await {
        Ok(deleted) => Ok(Json(
            json!({ "message": "Author deleted successfully!", "deleted": deleted }),
        )),
        Err(StoreError::NotFound) => Err(AppError::NotFound("Author not found")),
        Err(err) => Err(AppError::internal("Failed to delete author", err)),
    }
}
