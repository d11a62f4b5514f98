//! API route handlers

pub mod analytics;
pub mod auth;
pub mod comments;
pub mod notifications;
pub mod posts;
pub mod users;
