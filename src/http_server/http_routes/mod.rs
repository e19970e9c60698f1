pub mod auth;
pub mod file;
pub mod playlist;
pub mod user;
