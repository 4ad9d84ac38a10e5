use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{AppError, StoreError};
use crate::middleware::upload::{self, BlogSubmission};
use crate::models::post::{NewPost, PostChanges, PostWithAuthor};
use crate::services::authors::AuthorService;
use crate::services::posts::PostService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_blogs).post(create_blog))
        .route("/blog/:id", put(update_blog).delete(delete_blog))
}

async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<PostWithAuthor>>, AppError> {
    let blogs = state
        .posts
        .list_with_authors()
        .await
        .map_err(|err| AppError::internal("Failed to fetch blogs", err))?;
    Ok(Json(blogs))
}

async fn create_blog(
    State(state): State<AppState>,
    submission: BlogSubmission,
) -> Result<Json<Value>, AppError> {
    match state.authors.find(submission.author_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            if let Some(image) = &submission.image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            return Err(AppError::NotFound("Author not found"));
        }
        Err(err) => return Err(AppError::internal("Failed to create blog", err)),
    }

    let image = submission.image;
    let new_post = NewPost {
        title: submission.title,
        content: submission.content,
        author_id: submission.author_id,
        image_path: image.as_ref().map(|stored| stored.db_path.clone()),
    };

    match state.posts.create(&new_post).await {
        Ok(created) => Ok(Json(
            json!({ "message": "Blog created successfully!", "createdBlog": created }),
        )),
        Err(err) => {
            // the row never landed, so neither may the file
            if let Some(image) = &image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            Err(AppError::internal("Failed to create blog", err))
        }
    }
}

async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    submission: BlogSubmission,
) -> Result<Json<Value>, AppError> {
    let existing = match state.posts.find(id).await {
        Ok(post) => post,
        Err(StoreError::NotFound) => {
            if let Some(image) = &submission.image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            return Err(AppError::NotFound("Blog not found"));
        }
        Err(err) => return Err(AppError::internal("Failed to update blog", err)),
    };

    match state.authors.find(submission.author_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            if let Some(image) = &submission.image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            return Err(AppError::NotFound("Author not found"));
        }
        Err(err) => return Err(AppError::internal("Failed to update blog", err)),
    }

    let new_image = submission.image;
    let changes = PostChanges {
        title: submission.title,
        content: submission.content,
        author_id: submission.author_id,
        image_path: new_image.as_ref().map(|stored| stored.db_path.clone()),
    };

    // The replacement image is already on disk. The superseded file goes only
    // once the row update lands; if it does not, the new file goes instead.
    match state.posts.update(id, &changes).await {
        Ok(updated) => {
            if new_image.is_some() {
                if let Some(old) = &existing.image_path {
                    upload::remove_stored(&state.cfg.upload_dir, old).await;
                }
            }
            Ok(Json(
                json!({ "message": "Blog updated successfully!", "updated": updated }),
            ))
        }
        Err(err) => {
            if let Some(image) = &new_image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            Err(AppError::internal("Failed to update blog", err))
        }
    }
}

async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    match state.posts.delete(id).await {
        Ok(deleted) => {
            if let Some(stored) = &deleted.post.image_path {
                upload::remove_stored(&state.cfg.upload_dir, stored).await;
            }
            Ok(Json(
                json!({ "message": "Blog deleted successfully!", "deleted": deleted }),
            ))
        }
        Err(StoreError::NotFound) => Err(AppError::NotFound("Blog not found")),
        Err(err) => Err(AppError::internal("Failed to delete blog", err)),
    }
}
