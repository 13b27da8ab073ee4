pub mod admin;
pub mod auth;
pub mod image;
pub mod proxy;
