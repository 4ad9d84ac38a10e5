pub mod auth;
pub mod logging;
pub mod rate_limit;
pub mod upload;
