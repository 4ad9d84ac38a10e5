use axum::async_trait;
use diesel::prelude::*;

use crate::models::author::*;
use crate::models::post::Post;
use diesel_async::RunQueryDsl;

use crate::error::StoreError;
use crate::schema;

use super::Pool;

#[async_trait]
pub trait AuthorService {
    /// All authors ordered by name, each with their posts.
    async fn list_with_posts(&self) -> Result<Vec<AuthorWithPosts>, StoreError>;
    /// All authors ordered by name, posts not loaded.
    async fn list(&self) -> Result<Vec<Author>, StoreError>;
    async fn find(&self, author_id: i32) -> Result<Author, StoreError>;
    async fn create(&self, fields: &AuthorFields) -> Result<Author, StoreError>;
    async fn update(&self, author_id: i32, fields: &AuthorFields) -> Result<Author, StoreError>;
    async fn delete(&self, author_id: i32) -> Result<Author, StoreError>;
}

#[derive(Clone)]
pub struct AuthorServiceDb {
    db: Pool,
}

#[async_trait]
impl AuthorService for AuthorServiceDb {
    async fn list_with_posts(&self) -> Result<Vec<AuthorWithPosts>, StoreError> {
        let mut conn = self.db.get().await?;

        let all: Vec<Author> = schema::authors::table
            .order(schema::authors::name.asc())
            .select(Author::as_select())
            .load(&mut conn)
            .await?;
        let posts: Vec<Post> = Post::belonging_to(&all)
            .select(Post::as_select())
            .load(&mut conn)
            .await?;

        Ok(posts
            .grouped_by(&all)
            .into_iter()
            .zip(all)
            .map(|(posts, author)| AuthorWithPosts { author, posts })
            .collect())
    }

    async fn list(&self) -> Result<Vec<Author>, StoreError> {
        use schema::authors::dsl::*;

        let mut conn = self.db.get().await?;
        let all = authors
            .order(name.asc())
            .select(Author::as_select())
            .load(&mut conn)
            .await?;
        Ok(all)
    }

    async fn find(&self, author_id: i32) -> Result<Author, StoreError> {
        use schema::authors::dsl::*;

        let mut conn = self.db.get().await?;
        let author = authors
            .find(author_id)
            .select(Author::as_select())
            .first(&mut conn)
            .await?;
        Ok(author)
    }

    async fn create(&self, fields: &AuthorFields) -> Result<Author, StoreError> {
        use schema::authors::dsl::*;

        let mut conn = self.db.get().await?;
        let author = diesel::insert_into(authors)
            .values(fields)
            .get_result::<Author>(&mut conn)
            .await?;
        Ok(author)
    }

    async fn update(&self, author_id: i32, fields: &AuthorFields) -> Result<Author, StoreError> {
        use schema::authors::dsl::*;

        let mut conn = self.db.get().await?;
        let author = diesel::update(authors.find(author_id))
            .set(fields)
            .get_result::<Author>(&mut conn)
            .await?;
        Ok(author)
    }

    async fn delete(&self, author_id: i32) -> Result<Author, StoreError> {
        use schema::authors::dsl::*;

        let mut conn = self.db.get().await?;
        let author = diesel::delete(authors.find(author_id))
            .get_result::<Author>(&mut conn)
            .await?;
        Ok(author)
    }
}

impl AuthorServiceDb {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}
