use std::time::Duration;

use thiserror::Error;

/// Errors raised while fetching message body content from a locator.
///
/// Only remote loading surfaces errors. Missing local files and absent
/// locators are absorbed into an absent body instead.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The locator could not be parsed as a URL or local path.
    #[error("invalid locator `{0}`")]
    InvalidLocator(String),

    /// The locator uses a scheme no fetcher knows how to read.
    #[error("unsupported locator scheme `{0}`")]
    UnsupportedScheme(String),

    /// The remote endpoint answered with a non-success status.
    #[error("fetching `{locator}` returned HTTP {status}")]
    Status {
        /// The locator that was requested.
        locator: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The remote endpoint did not answer within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("transport error: {0}")]
    Transport(String),

    /// Reading a `file` locator failed.
    #[error("reading `{locator}` failed: {source}")]
    Io {
        /// The locator that was read.
        locator: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The fetched body exceeded the configured size limit.
    #[error("content at `{locator}` exceeds {limit} bytes")]
    TooLarge {
        /// The locator that was requested.
        locator: String,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// The fetcher was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl FetchError {
    /// Returns `true` if the error is transient and the fetch may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// The first completeness rule a [`Message`](crate::Message) fails.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The `to` list is empty.
    #[error("message has no `to` recipients")]
    NoRecipients,

    /// The sender address is absent or empty.
    #[error("message has no sender address")]
    NoSender,

    /// Subject, text body and HTML body are all absent or empty.
    #[error("message needs a subject, a text body or an HTML body")]
    NoContent,
}
