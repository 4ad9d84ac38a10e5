use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::Router;
use tera::Context;

use crate::error::StoreError;
use crate::middleware::upload::{self, BlogSubmission};
use crate::models::post::{NewPost, PostChanges};
use crate::services::authors::AuthorService;
use crate::services::posts::PostService;
use crate::state::AppState;

// The server-rendered flow reports failures as short plain-text pages.
type ViewError = (StatusCode, &'static str);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/new", get(render_create))
        .route("/:id/edit", get(render_edit))
        .route("/:id/update", post(update_post))
        .route("/:id/delete", post(delete_post))
}

fn render(state: &AppState, template: &str, ctx: &Context, failure: &'static str) -> Result<Html<String>, ViewError> {
    state.tera.render(template, ctx).map(Html).map_err(|err| {
        tracing::error!(%err, template, "template rendering failed");
        (StatusCode::INTERNAL_SERVER_ERROR, failure)
    })
}

async fn list_posts(State(state): State<AppState>) -> Result<Html<String>, ViewError> {
    let posts = state
        .posts
        .list_with_authors()
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load posts"))?;

    let mut ctx = Context::new();
    ctx.insert("posts", &posts);
    render(&state, "blog/list.html", &ctx, "Failed to load posts")
}

async fn render_create(State(state): State<AppState>) -> Result<Html<String>, ViewError> {
    let authors = state
        .authors
        .list()
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load form"))?;

    let mut ctx = Context::new();
    ctx.insert("mode", "create");
    ctx.insert("post", &None::<()>);
    ctx.insert("authors", &authors);
    render(&state, "blog/form.html", &ctx, "Failed to load form")
}

async fn create_post(
    State(state): State<AppState>,
    submission: BlogSubmission,
) -> Result<Redirect, ViewError> {
    if let Err(failure) = ensure_author(&state, &submission).await {
        return Err(failure);
    }

    let image = submission.image;
    let new_post = NewPost {
        title: submission.title,
        content: submission.content,
        author_id: submission.author_id,
        image_path: image.as_ref().map(|stored| stored.db_path.clone()),
    };

    match state.posts.create(&new_post).await {
        Ok(_) => Ok(Redirect::to("/blog-view")),
        Err(err) => {
            if let Some(image) = &image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            tracing::error!(%err, "creating post from form failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to create post"))
        }
    }
}

async fn render_edit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, ViewError> {
    let post = match state.posts.find(id).await {
        Ok(post) => post,
        Err(StoreError::NotFound) => return Err((StatusCode::NOT_FOUND, "Post not found")),
        Err(_) => return Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to load form")),
    };
    let authors = state
        .authors
        .list()
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load form"))?;

    let mut ctx = Context::new();
    ctx.insert("mode", "edit");
    ctx.insert("post", &post);
    ctx.insert("authors", &authors);
    render(&state, "blog/form.html", &ctx, "Failed to load form")
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    submission: BlogSubmission,
) -> Result<Redirect, ViewError> {
    let existing = match state.posts.find(id).await {
        Ok(post) => post,
        Err(StoreError::NotFound) => {
            discard_image(&state, &submission).await;
            return Err((StatusCode::NOT_FOUND, "Post not found"));
        }
        Err(_) => return Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to update post")),
    };

    if let Err(failure) = ensure_author(&state, &submission).await {
        return Err(failure);
    }

    let new_image = submission.image;
    let changes = PostChanges {
        title: submission.title,
        content: submission.content,
        author_id: submission.author_id,
        image_path: new_image.as_ref().map(|stored| stored.db_path.clone()),
    };

    match state.posts.update(id, &changes).await {
        Ok(_) => {
            if new_image.is_some() {
                if let Some(old) = &existing.image_path {
                    upload::remove_stored(&state.cfg.upload_dir, old).await;
                }
            }
            Ok(Redirect::to("/blog-view"))
        }
        Err(err) => {
            if let Some(image) = &new_image {
                upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
            }
            tracing::error!(%err, "updating post from form failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to update post"))
        }
    }
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, ViewError> {
    match state.posts.delete(id).await {
        Ok(deleted) => {
            if let Some(stored) = &deleted.post.image_path {
                upload::remove_stored(&state.cfg.upload_dir, stored).await;
            }
            Ok(Redirect::to("/blog-view"))
        }
        Err(StoreError::NotFound) => Err((StatusCode::NOT_FOUND, "Post not found")),
        Err(err) => {
            tracing::error!(%err, "deleting post from form failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete post"))
        }
    }
}

async fn ensure_author(state: &AppState, submission: &BlogSubmission) -> Result<(), ViewError> {
    match state.authors.find(submission.author_id).await {
        Ok(_) => Ok(()),
        Err(StoreError::NotFound) => {
            discard_image(state, submission).await;
            Err((StatusCode::NOT_FOUND, "Author not found"))
        }
        Err(_) => Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to save post")),
    }
}

async fn discard_image(state: &AppState, submission: &BlogSubmission) {
    if let Some(image) = &submission.image {
        upload::remove_stored(&state.cfg.upload_dir, &image.db_path).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tera::{Context, Tera};

    use crate::models::author::Author;
    use crate::models::post::{Post, PostWithAuthor};

    fn templates() -> Tera {
        Tera::new("templates/**/*.html").unwrap()
    }

    fn sample_author() -> Author {
        Author {
            id: 7,
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            number: "123".to_string(),
        }
    }

    fn sample_post() -> PostWithAuthor {
        PostWithAuthor {
            post: Post {
                id: 1,
                title: "First post".to_string(),
                content: "Hello there".to_string(),
                image_path: Some("uploads/image-1.png".to_string()),
                author_id: 7,
                created_at: Utc::now(),
            },
            author: sample_author(),
        }
    }

    #[test]
    fn list_template_renders_posts() {
        let mut ctx = Context::new();
        ctx.insert("posts", &vec![sample_post()]);
        let html = templates().render("blog/list.html", &ctx).unwrap();
        assert!(html.contains("First post"));
        assert!(html.contains("uploads/image-1.png"));
        assert!(html.contains("/blog-view/1/edit"));
    }

    #[test]
    fn list_template_renders_empty_state() {
        let mut ctx = Context::new();
        ctx.insert("posts", &Vec::<PostWithAuthor>::new());
        let html = templates().render("blog/list.html", &ctx).unwrap();
        assert!(html.contains("No posts yet."));
    }

    #[test]
    fn form_template_renders_create_mode() {
        let mut ctx = Context::new();
        ctx.insert("mode", "create");
        ctx.insert("post", &None::<()>);
        ctx.insert("authors", &vec![sample_author()]);
        let html = templates().render("blog/form.html", &ctx).unwrap();
        assert!(html.contains("New post"));
        assert!(html.contains("action=\"/blog-view\""));
    }

    #[test]
    fn form_template_renders_edit_mode() {
        let mut ctx = Context::new();
        ctx.insert("mode", "edit");
        ctx.insert("post", &sample_post().post);
        ctx.insert("authors", &vec![sample_author()]);
        let html = templates().render("blog/form.html", &ctx).unwrap();
        assert!(html.contains("Edit post"));
        assert!(html.contains("action=\"/blog-view/1/update\""));
        assert!(html.contains("selected"));
    }
}
