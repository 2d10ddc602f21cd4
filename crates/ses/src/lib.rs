//! Outbound email message model for the Amazon SES sending API.
//!
//! [`Message`] accumulates recipients, sender identity, subject and body
//! content, and answers whether it is complete enough to attempt a send.
//! Body content can come from a string, a local file, or a remote locator
//! fetched through a [`ContentFetcher`].
//!
//! Sending, signing, retries and MIME assembly belong to the caller.

pub mod config;
pub mod content;
pub mod error;
pub mod message;

pub use config::FetchConfig;
pub use content::{ContentFetcher, HttpFetcher, read_body_file};
pub use error::{FetchError, ValidationError};
pub use message::Message;
