//! Content API client: paginated listing with rate limiting and retry.

pub mod client;

pub use client::ApiClient;
