use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::models::author::Author;

#[derive(Serialize, Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(belongs_to(Author))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub image_path: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub author_id: i32,
    // None leaves the stored path untouched
    pub image_path: Option<String>,
}

/// Post joined to its author, the shape the blog endpoints respond with.
#[derive(Serialize, Debug)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: Author,
}
