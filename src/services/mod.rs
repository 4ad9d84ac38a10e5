pub mod authors;
pub mod posts;
pub mod users;

pub type Pool = diesel_async::pooled_connection::deadpool::Pool<diesel_async::AsyncPgConnection>;
