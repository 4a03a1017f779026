//! # MiniTask Shared Library
//!
//! This crate contains the types, persistence layer, and business logic shared
//! by the MiniTask API server and the Telegram bot process.
//!
//! ## Module Organization
//!
//! - `db`: Connection pooling and migrations
//! - `models`: Database models (users, plans, tasks) and their queries
//! - `auth`: Telegram init-data verification
//! - `analysis`: Keyword-based task priority classifier
//! - `telegram`: Bot API profile lookup

pub mod analysis;
pub mod auth;
pub mod db;
pub mod models;
pub mod telegram;

/// Current version of the MiniTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
