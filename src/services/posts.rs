use axum::async_trait;
use diesel::prelude::*;

use crate::models::author::Author;
use crate::models::post::*;
use diesel_async::RunQueryDsl;

use crate::error::StoreError;
use crate::schema;

use super::Pool;

#[async_trait]
pub trait PostService {
    /// All posts newest first, each joined to its author.
    async fn list_with_authors(&self) -> Result<Vec<PostWithAuthor>, StoreError>;
    async fn find(&self, post_id: i32) -> Result<Post, StoreError>;
    async fn create(&self, new_post: &NewPost) -> Result<PostWithAuthor, StoreError>;
    async fn update(&self, post_id: i32, changes: &PostChanges) -> Result<PostWithAuthor, StoreError>;
    async fn delete(&self, post_id: i32) -> Result<PostWithAuthor, StoreError>;
}

#[derive(Clone)]
pub struct PostServiceDb {
    db: Pool,
}

#[async_trait]
impl PostService for PostServiceDb {
    async fn list_with_authors(&self) -> Result<Vec<PostWithAuthor>, StoreError> {
        let mut conn = self.db.get().await?;

        let rows: Vec<(Post, Author)> = schema::posts::table
            .inner_join(schema::authors::table)
            .order(schema::posts::created_at.desc())
            .select((Post::as_select(), Author::as_select()))
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(post, author)| PostWithAuthor { post, author })
            .collect())
    }

    async fn find(&self, post_id: i32) -> Result<Post, StoreError> {
        use schema::posts::dsl::*;

        let mut conn = self.db.get().await?;
        let post = posts
            .find(post_id)
            .select(Post::as_select())
            .first(&mut conn)
            .await?;
        Ok(post)
    }

    async fn create(&self, new_post: &NewPost) -> Result<PostWithAuthor, StoreError> {
        let mut conn = self.db.get().await?;

        let post: Post = diesel::insert_into(schema::posts::table)
            .values(new_post)
            .get_result(&mut conn)
            .await?;
        let author = schema::authors::table
            .find(post.author_id)
            .select(Author::as_select())
            .first(&mut conn)
            .await?;
        Ok(PostWithAuthor { post, author })
    }

    async fn update(&self, post_id: i32, changes: &PostChanges) -> Result<PostWithAuthor, StoreError> {
        let mut conn = self.db.get().await?;

        let post: Post = diesel::update(schema::posts::table.find(post_id))
            .set(changes)
            .get_result(&mut conn)
            .await?;
        let author = schema::authors::table
            .find(post.author_id)
            .select(Author::as_select())
            .first(&mut conn)
            .await?;
        Ok(PostWithAuthor { post, author })
    }

    async fn delete(&self, post_id: i32) -> Result<PostWithAuthor, StoreError> {
        let mut conn = self.db.get().await?;

        let post: Post = diesel::delete(schema::posts::table.find(post_id))
            .get_result(&mut conn)
            .await?;
        let author = schema::authors::table
            .find(post.author_id)
            .select(Author::as_select())
            .first(&mut conn)
            .await?;
        Ok(PostWithAuthor { post, author })
    }
}

impl PostServiceDb {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}
