/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `tasks`: Task CRUD, sharing, and priority analysis
/// - `plans`: Plan CRUD and sharing
/// - `reminders`: Tasks due within the next hour
/// - `telegram`: Telegram profile sync

pub mod health;
pub mod plans;
pub mod reminders;
pub mod tasks;
pub mod telegram;
