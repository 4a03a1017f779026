//! # MiniTask API Server Library
//!
//! This library provides the core functionality for the MiniTask API server,
//! the backend of a Telegram mini-app for tasks and plans.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, and init data authentication
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
