pub mod client;
pub mod error;
pub mod questions;
pub mod secrets;
pub mod story;

pub use client::{CompletionClient, RetryPolicy};
pub use error::CompletionError;
pub use questions::request_questions;
pub use secrets::ensure_api_key;
pub use story::request_story;
