use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::post::Post;

#[derive(Serialize, Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub number: String,
}

// Same shape for create and update: the API always submits all three fields.
#[derive(Deserialize, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorFields {
    pub name: String,
    pub email: String,
    pub number: String,
}

/// Author joined to its posts, as returned by `GET /api/authors`.
#[derive(Serialize, Debug)]
pub struct AuthorWithPosts {
    #[serde(flatten)]
    pub author: Author,
    pub posts: Vec<Post>,
}
