pub mod file;
pub mod image;
pub mod user;
