/// Shared modules for the alert feed client
pub mod buffer;
pub mod cache;
pub mod config;
pub mod feed;
pub mod fetcher;
pub mod types;
pub mod validate;
pub mod websocket;
