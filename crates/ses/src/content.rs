//! Loading message body content from local files and remote locators.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use reqwest::Url;
use tracing::{debug, error, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Read a body file if it exists, is a regular file and is readable.
///
/// Anything else yields `None`; a missing or unreadable file is never an
/// error. Bytes that are not valid UTF-8 are replaced with U+FFFD.
pub fn read_body_file(path: &Path) -> Option<String> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            warn!(path = %path.display(), "body path is not a regular file, skipping");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "body file not accessible, skipping");
            return None;
        }
    }

    match fs::read(path) {
        Ok(bytes) => {
            debug!(path = %path.display(), len = bytes.len(), "loaded body file");
            Some(decode_body(bytes))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "body file not readable, skipping");
            None
        }
    }
}

fn decode_body(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Source of body content addressed by a locator string.
///
/// The default implementation is [`HttpFetcher`]. Callers that need their
/// own timeouts, caching or test doubles can supply another implementation
/// to [`Message::set_message_from_url_with`](crate::Message::set_message_from_url_with).
pub trait ContentFetcher: Send + Sync + std::fmt::Debug {
    /// Fetch the full content named by `locator`, blocking until done.
    fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

/// Blocking fetcher for `http`, `https` and `file` locators.
///
/// A locator that does not parse as an absolute URL is read as a local path.
/// Locators must carry their scheme: `localhost:8080/body.txt` parses with
/// the scheme `localhost` and is rejected as unsupported. On Windows a
/// single-letter scheme is a drive prefix (`C:\body.txt`) and is read as a
/// path.
///
/// Bodies are read in a stream and the read stops once `max_body_bytes` is
/// exceeded. Must not be called from inside an async runtime worker thread.
pub struct HttpFetcher {
    config: FetchConfig,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("config", &self.config)
            .field("client", &"<BlockingClient>")
            .finish()
    }
}

impl HttpFetcher {
    /// Build a fetcher and its HTTP client from the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Configuration(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn fetch_http(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let locator = url.to_string();
        debug!(locator = %locator, "fetching body content");

        let response = self.client.get(url).send().map_err(|e| {
            error!(locator = %locator, error = %e, "body fetch failed");
            self.classify(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(locator = %locator, status = status.as_u16(), "body fetch rejected");
            return Err(FetchError::Status {
                locator,
                status: status.as_u16(),
            });
        }

        if let (Some(limit), Some(len)) = (self.config.max_body_bytes, response.content_length()) {
            if len > limit {
                return Err(FetchError::TooLarge { locator, limit });
            }
        }

        let bytes = read_bounded(response, self.config.max_body_bytes).map_err(|e| {
            error!(locator = %locator, error = %e, "reading body content failed");
            if e.kind() == io::ErrorKind::TimedOut {
                self.timeout_error(false)
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;
        debug!(locator = %locator, len = bytes.len(), "fetched body content");
        Ok(bytes)
    }

    fn classify(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            self.timeout_error(err.is_connect())
        } else {
            FetchError::Transport(err.to_string())
        }
    }

    /// The timeout that expired: the connect timeout while connecting, the
    /// total request timeout otherwise.
    fn timeout_error(&self, during_connect: bool) -> FetchError {
        if during_connect {
            FetchError::Timeout(self.config.connect_timeout())
        } else {
            FetchError::Timeout(self.config.timeout())
        }
    }

    fn check_limit(&self, locator: &str, bytes: &[u8]) -> Result<(), FetchError> {
        match self.config.max_body_bytes {
            Some(limit) if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > limit => {
                Err(FetchError::TooLarge {
                    locator: locator.to_owned(),
                    limit,
                })
            }
            _ => Ok(()),
        }
    }

    fn read_local(&self, locator: &str, path: &Path) -> Result<Vec<u8>, FetchError> {
        fs::File::open(path)
            .and_then(|file| read_bounded(file, self.config.max_body_bytes))
            .map_err(|source| {
                error!(locator = %locator, error = %source, "reading body locator failed");
                FetchError::Io {
                    locator: locator.to_owned(),
                    source,
                }
            })
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        let bytes = match Url::parse(locator) {
            Ok(url) => match url.scheme() {
                "http" | "https" => self.fetch_http(url)?,
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|()| FetchError::InvalidLocator(locator.to_owned()))?;
                    self.read_local(locator, &path)?
                }
                drive if cfg!(windows) && drive.len() == 1 => {
                    self.read_local(locator, Path::new(locator))?
                }
                other => return Err(FetchError::UnsupportedScheme(other.to_owned())),
            },
            Err(_) => self.read_local(locator, Path::new(locator))?,
        };

        self.check_limit(locator, &bytes)?;
        Ok(decode_body(bytes))
    }
}

/// Read `reader` to the end, stopping one byte past `limit` so an oversized
/// body is never held in full.
fn read_bounded(mut reader: impl Read, limit: Option<u64>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match limit {
        Some(limit) => reader.take(limit.saturating_add(1)).read_to_end(&mut buf)?,
        None => reader.read_to_end(&mut buf)?,
    };
    Ok(buf)
}
