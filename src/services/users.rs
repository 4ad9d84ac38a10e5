use axum::async_trait;
use diesel::prelude::*;

use crate::models::user::*;
use diesel_async::RunQueryDsl;

use crate::error::StoreError;
use crate::schema;

use super::Pool;

#[async_trait]
pub trait UserService {
    async fn create(&self, new_user: &NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, user_email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct UserServiceDb {
    db: Pool,
}

#[async_trait]
impl UserService for UserServiceDb {
    async fn create(&self, new_user: &NewUser) -> Result<User, StoreError> {
        use schema::users::dsl::*;

        let mut conn = self.db.get().await?;

        let user = diesel::insert_into(users)
            .values(new_user)
            .get_result::<User>(&mut conn)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, user_email: &str) -> Result<Option<User>, StoreError> {
        use schema::users::dsl::*;

        let mut conn = self.db.get().await?;
        let user = users
            .filter(email.eq(user_email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        use schema::users::dsl::*;

        let mut conn = self.db.get().await?;
        let user = users
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }
}

impl UserServiceDb {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}
