//! Rust client for the community platform API.
//!
//! Wraps the REST surface in typed methods and handles the response
//! envelope, bearer-token auth and error-code mapping.

pub mod client;
pub mod error;
pub mod types;

pub use client::CommunityClient;
pub use error::ClientError;
