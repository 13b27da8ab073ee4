mod common;

mod proxy;
mod upload;
