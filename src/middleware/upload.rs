use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json, RequestExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

pub fn is_allowed_image(mime: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&mime)
}

/// Stored name: field label, time-ordered uuid, original extension.
pub fn unique_name(field: &str, original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{field}-{}{ext}", Uuid::now_v7().as_simple())
}

/// Forward-slash logical path persisted on the post row, decoupled from the
/// physical upload root.
pub fn logical_path(file_name: &str) -> String {
    format!("uploads/{file_name}")
}

fn physical_path(upload_dir: &Path, stored: &str) -> PathBuf {
    match stored.strip_prefix("uploads/") {
        Some(file_name) => upload_dir.join(file_name),
        None => PathBuf::from(stored),
    }
}

/// An image written to the upload directory, plus the logical path that goes
/// in the database.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    pub db_path: String,
}

pub async fn store(
    upload_dir: &Path,
    field: &str,
    original: &str,
    bytes: &[u8],
) -> anyhow::Result<StoredImage> {
    let file_name = unique_name(field, original);
    let dest = upload_dir.join(&file_name);
    tokio::fs::write(&dest, bytes)
        .await
        .with_context(|| format!("writing upload {}", dest.display()))?;
    let db_path = logical_path(&file_name);
    Ok(StoredImage { file_name, db_path })
}

/// Best-effort removal of a stored image. A missing file is fine; anything
/// else is logged and swallowed.
pub async fn remove_stored(upload_dir: &Path, stored: &str) {
    let path = physical_path(upload_dir, stored);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::error!(path = %path.display(), %err, "failed to delete stored image");
        }
    }
}

/// A create/update post submission. Accepts JSON and urlencoded bodies, or
/// multipart form data carrying an optional single `image` file; an accepted
/// image is written to the upload directory during extraction, before any
/// database work.
pub struct BlogSubmission {
    pub title: String,
    pub author_id: i32,
    pub content: String,
    pub image: Option<StoredImage>,
}

#[derive(Deserialize, Default)]
struct RawFields {
    title: Option<String>,
    #[serde(rename = "authorId")]
    author_id: Option<AuthorIdParam>,
    content: Option<String>,
}

// authorId arrives as a JSON number, a JSON string, or a form field.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorIdParam {
    Num(i64),
    Text(String),
}

#[async_trait]
impl FromRequest<AppState> for BlogSubmission {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let (raw, image) = if content_type.starts_with("multipart/form-data") {
            let multipart = req
                .extract::<Multipart, _>()
                .await
                .map_err(|err| AppError::Validation(err.to_string()))?;
            read_multipart(multipart, state).await?
        } else if content_type.starts_with("application/json") {
            let Json(raw) = req
                .extract::<Json<RawFields>, _>()
                .await
                .map_err(|err| AppError::Validation(err.to_string()))?;
            (raw, None)
        } else {
            let Form(raw) = req
                .extract::<Form<RawFields>, _>()
                .await
                .map_err(|err| AppError::Validation(err.to_string()))?;
            (raw, None)
        };

        match validate(raw) {
            Ok((title, author_id, content)) => Ok(BlogSubmission {
                title,
                author_id,
                content,
                image,
            }),
            Err(err) => {
                // an already-written image must not outlive its rejected request
                if let Some(image) = image {
                    remove_stored(&state.cfg.upload_dir, &image.db_path).await;
                }
                Err(err)
            }
        }
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    state: &AppState,
) -> Result<(RawFields, Option<StoredImage>), AppError> {
    let mut raw = RawFields::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => raw.title = Some(read_text(field).await?),
            "authorId" => raw.author_id = Some(AuthorIdParam::Text(read_text(field).await?)),
            "content" => raw.content = Some(read_text(field).await?),
            "image" => {
                let original = field.file_name().unwrap_or_default().to_owned();
                let mime = field.content_type().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Validation(err.to_string()))?;
                // an empty file input still submits an empty part
                if original.is_empty() && bytes.is_empty() {
                    continue;
                }
                if !is_allowed_image(&mime) {
                    return Err(AppError::Validation(
                        "Only image files are allowed (jpg, png, gif, webp)".to_string(),
                    ));
                }
                let stored = store(&state.cfg.upload_dir, "image", &original, &bytes)
                    .await
                    .map_err(|err| AppError::internal("Failed to store upload", err))?;
                image = Some(stored);
            }
            _ => {}
        }
    }

    Ok((raw, image))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))
}

fn validate(raw: RawFields) -> Result<(String, i32, String), AppError> {
    let title = raw.title.filter(|value| !value.trim().is_empty());
    let content = raw.content.filter(|value| !value.trim().is_empty());
    let author_id = match raw.author_id {
        Some(AuthorIdParam::Text(value)) if value.trim().is_empty() => None,
        other => other,
    };

    let (Some(title), Some(author_id), Some(content)) = (title, author_id, content) else {
        return Err(AppError::Validation(
            "Title, authorId, and content are required".to_string(),
        ));
    };

    let author_id = match author_id {
        AuthorIdParam::Num(value) => i32::try_from(value).ok(),
        AuthorIdParam::Text(value) => value.trim().parse::<i32>().ok(),
    }
    .ok_or_else(|| AppError::Validation("authorId must be a valid number".to_string()))?;

    Ok((title, author_id, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_mime_allow_list() {
        assert!(is_allowed_image("image/jpeg"));
        assert!(is_allowed_image("image/png"));
        assert!(is_allowed_image("image/gif"));
        assert!(is_allowed_image("image/webp"));
        assert!(!is_allowed_image("image/svg+xml"));
        assert!(!is_allowed_image("application/pdf"));
        assert!(!is_allowed_image(""));
    }

    #[test]
    fn unique_names_keep_the_extension() {
        let name = unique_name("image", "cat.png");
        assert!(name.starts_with("image-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn unique_names_do_not_collide() {
        assert_ne!(unique_name("image", "cat.png"), unique_name("image", "cat.png"));
    }

    #[test]
    fn extensionless_uploads_get_no_dot() {
        let name = unique_name("image", "cat");
        assert!(!name.contains('.'));
    }

    #[test]
    fn logical_paths_are_forward_slash_prefixed() {
        assert_eq!(logical_path("image-abc.png"), "uploads/image-abc.png");
    }

    #[test]
    fn physical_path_resolves_against_the_upload_root() {
        let dir = Path::new("/srv/uploads");
        assert_eq!(
            physical_path(dir, "uploads/image-abc.png"),
            PathBuf::from("/srv/uploads/image-abc.png")
        );
    }

    #[tokio::test]
    async fn store_then_remove_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let stored = store(dir.path(), "image", "cat.png", b"not really a png")
            .await
            .unwrap();
        let on_disk = dir.path().join(&stored.file_name);
        assert!(on_disk.exists());
        assert_eq!(stored.db_path, format!("uploads/{}", stored.file_name));

        remove_stored(dir.path(), &stored.db_path).await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn removing_a_missing_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        remove_stored(dir.path(), "uploads/never-written.png").await;
    }

    #[test]
    fn submissions_missing_fields_are_rejected() {
        let raw = RawFields {
            title: Some("A title".into()),
            author_id: None,
            content: Some("words".into()),
        };
        assert!(matches!(validate(raw), Err(AppError::Validation(_))));

        let raw = RawFields {
            title: Some("  ".into()),
            author_id: Some(AuthorIdParam::Num(1)),
            content: Some("words".into()),
        };
        assert!(matches!(validate(raw), Err(AppError::Validation(_))));
    }

    #[test]
    fn author_id_accepts_numbers_and_numeric_strings() {
        let raw = RawFields {
            title: Some("A title".into()),
            author_id: Some(AuthorIdParam::Text("7".into())),
            content: Some("words".into()),
        };
        let (_, author_id, _) = validate(raw).unwrap();
        assert_eq!(author_id, 7);

        let raw = RawFields {
            title: Some("A title".into()),
            author_id: Some(AuthorIdParam::Text("seven".into())),
            content: Some("words".into()),
        };
        assert!(matches!(validate(raw), Err(AppError::Validation(_))));
    }
}
