use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::FetchConfig;
use crate::content::{ContentFetcher, HttpFetcher, read_body_file};
use crate::error::{FetchError, ValidationError};

/// An outbound email message being composed for the SES sending API.
///
/// Fields are only mutated through the methods below. The sending side reads
/// them back through the accessors and owns MIME assembly, signing and
/// transport.
///
/// # Examples
///
/// ```
/// use sarasa_ses::Message;
///
/// let mut message = Message::new();
/// message
///     .add_to("user@example.com")
///     .add_cc_all(["ops@example.com", "audit@example.com"])
///     .set_from("noreply@example.com")
///     .set_subject("Welcome");
/// message.set_message_from_string("Hello!", Some("<h1>Hello!</h1>"));
///
/// assert!(message.validate());
/// assert_eq!(message.cc().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    reply_to: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_charset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    message_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_text_charset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_html_charset: Option<String>,
}

impl Message {
    /// Create an empty message: no recipients, every scalar absent.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Recipients ----

    /// Append one `To` address.
    pub fn add_to(&mut self, address: impl Into<String>) -> &mut Self {
        self.to.push(address.into());
        self
    }

    /// Append every address, in order, to the `To` list.
    pub fn add_to_all<I, S>(&mut self, addresses: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Append one `Cc` address.
    pub fn add_cc(&mut self, address: impl Into<String>) -> &mut Self {
        self.cc.push(address.into());
        self
    }

    /// Append every address, in order, to the `Cc` list.
    pub fn add_cc_all<I, S>(&mut self, addresses: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cc.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Append one `Bcc` address.
    pub fn add_bcc(&mut self, address: impl Into<String>) -> &mut Self {
        self.bcc.push(address.into());
        self
    }

    /// Append every address, in order, to the `Bcc` list.
    pub fn add_bcc_all<I, S>(&mut self, addresses: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bcc.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Append one `Reply-To` address.
    pub fn add_reply_to(&mut self, address: impl Into<String>) -> &mut Self {
        self.reply_to.push(address.into());
        self
    }

    /// Append every address, in order, to the `Reply-To` list.
    pub fn add_reply_to_all<I, S>(&mut self, addresses: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reply_to.extend(addresses.into_iter().map(Into::into));
        self
    }

    // ---- Scalars ----
    //
    // Setters and loaders borrow their arguments and store owned copies;
    // optional companions are `Option<&str>` / `Option<&Path>`.

    /// Set the sender address, replacing any previous value.
    pub fn set_from(&mut self, address: &str) -> &mut Self {
        self.from = Some(address.to_owned());
        self
    }

    /// Set the bounce (`Return-Path`) address, replacing any previous value.
    pub fn set_return_path(&mut self, address: &str) -> &mut Self {
        self.return_path = Some(address.to_owned());
        self
    }

    /// Set the subject line, replacing any previous value.
    pub fn set_subject(&mut self, subject: &str) -> &mut Self {
        self.subject = Some(subject.to_owned());
        self
    }

    /// Set the subject's character set, replacing any previous value.
    pub fn set_subject_charset(&mut self, charset: &str) -> &mut Self {
        self.subject_charset = Some(charset.to_owned());
        self
    }

    // ---- Bodies ----

    /// Replace both bodies with the given strings. A missing `html` clears
    /// the HTML body.
    pub fn set_message_from_string(&mut self, text: &str, html: Option<&str>) -> &mut Self {
        self.message_text = Some(text.to_owned());
        self.message_html = html.map(str::to_owned);
        self
    }

    /// Replace both bodies with the contents of local files.
    ///
    /// Each side is loaded only when its path names an existing, regular,
    /// readable file; otherwise that side becomes absent. This never fails.
    pub fn set_message_from_file(
        &mut self,
        text_path: &Path,
        html_path: Option<&Path>,
    ) -> &mut Self {
        self.message_text = read_body_file(text_path);
        self.message_html = html_path.and_then(read_body_file);
        self
    }

    /// Replace both bodies with content fetched from locators, using an
    /// [`HttpFetcher`] built from [`FetchConfig::default`].
    ///
    /// An absent locator clears that side without fetching. If any fetch
    /// fails the error is returned and the message is left unchanged.
    pub fn set_message_from_url(
        &mut self,
        text_locator: Option<&str>,
        html_locator: Option<&str>,
    ) -> Result<&mut Self, FetchError> {
        if text_locator.is_none() && html_locator.is_none() {
            self.message_text = None;
            self.message_html = None;
            return Ok(self);
        }
        let fetcher = HttpFetcher::new(FetchConfig::default())?;
        self.set_message_from_url_with(&fetcher, text_locator, html_locator)
    }

    /// Same as [`set_message_from_url`](Self::set_message_from_url) with a
    /// caller-supplied fetcher.
    pub fn set_message_from_url_with(
        &mut self,
        fetcher: &dyn ContentFetcher,
        text_locator: Option<&str>,
        html_locator: Option<&str>,
    ) -> Result<&mut Self, FetchError> {
        let text = text_locator.map(|l| fetcher.fetch(l)).transpose()?;
        let html = html_locator.map(|l| fetcher.fetch(l)).transpose()?;

        debug!(
            text = text.is_some(),
            html = html.is_some(),
            "message bodies loaded from locators"
        );

        self.message_text = text;
        self.message_html = html;
        Ok(self)
    }

    /// Replace both body charsets. Bodies are left untouched.
    pub fn set_message_charset(
        &mut self,
        text_charset: &str,
        html_charset: Option<&str>,
    ) -> &mut Self {
        self.message_text_charset = Some(text_charset.to_owned());
        self.message_html_charset = html_charset.map(str::to_owned);
        self
    }

    // ---- Validation ----

    /// Check that the message has enough to attempt a send: at least one
    /// `To` recipient, a non-empty sender, and at least one of subject,
    /// text body or HTML body non-empty.
    ///
    /// This does not guarantee delivery, nor that the send request will be
    /// accepted.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.to.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        if is_blank(self.from.as_deref()) {
            return Err(ValidationError::NoSender);
        }
        if is_blank(self.subject.as_deref())
            && is_blank(self.message_text.as_deref())
            && is_blank(self.message_html.as_deref())
        {
            return Err(ValidationError::NoContent);
        }
        Ok(())
    }

    /// Returns `true` if [`check`](Self::check) passes.
    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    // ---- Accessors ----

    /// `To` recipients in the order they were added.
    pub fn to(&self) -> &[String] {
        &self.to
    }

    /// `Cc` recipients in the order they were added.
    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    /// `Bcc` recipients in the order they were added.
    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    /// `Reply-To` addresses in the order they were added.
    pub fn reply_to(&self) -> &[String] {
        &self.reply_to
    }

    /// Sender address, if set.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Bounce address, if set.
    pub fn return_path(&self) -> Option<&str> {
        self.return_path.as_deref()
    }

    /// Subject line, if set.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Character set of the subject, if set.
    pub fn subject_charset(&self) -> Option<&str> {
        self.subject_charset.as_deref()
    }

    /// Plain-text body, if loaded.
    pub fn message_text(&self) -> Option<&str> {
        self.message_text.as_deref()
    }

    /// HTML body, if loaded.
    pub fn message_html(&self) -> Option<&str> {
        self.message_html.as_deref()
    }

    /// Character set of the plain-text body, if set.
    pub fn message_text_charset(&self) -> Option<&str> {
        self.message_text_charset.as_deref()
    }

    /// Character set of the HTML body, if set.
    pub fn message_html_charset(&self) -> Option<&str> {
        self.message_html_charset.as_deref()
    }
}

// Empty strings count as unset.
fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Fetcher that serves canned bodies and records every locator asked for.
    #[derive(Debug, Default)]
    struct RecordingFetcher {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ContentFetcher for RecordingFetcher {
        fn fetch(&self, locator: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(locator.to_owned());
            if self.fail_on == Some(locator) {
                return Err(FetchError::Status {
                    locator: locator.to_owned(),
                    status: 500,
                });
            }
            Ok(format!("content of {locator}"))
        }
    }

    fn sendable() -> Message {
        let mut message = Message::new();
        message.add_to("x@y.com").set_from("a@b.com");
        message
    }

    #[test]
    fn new_message_is_empty() {
        let message = Message::new();
        assert!(message.to().is_empty());
        assert!(message.cc().is_empty());
        assert!(message.bcc().is_empty());
        assert!(message.reply_to().is_empty());
        assert!(message.from().is_none());
        assert!(message.return_path().is_none());
        assert!(message.subject().is_none());
        assert!(message.subject_charset().is_none());
        assert!(message.message_text().is_none());
        assert!(message.message_html().is_none());
        assert!(message.message_text_charset().is_none());
        assert!(message.message_html_charset().is_none());
    }

    #[test]
    fn accumulation_concatenates_in_call_order() {
        let mut message = Message::new();
        message
            .add_to("a@example.com")
            .add_to_all(["b@example.com", "c@example.com"])
            .add_to("a@example.com");
        assert_eq!(
            message.to(),
            ["a@example.com", "b@example.com", "c@example.com", "a@example.com"]
        );
    }

    #[test]
    fn single_and_many_compose_like_flattening() {
        let mut one_by_one = Message::new();
        one_by_one.add_bcc("a").add_bcc("b").add_bcc("c");

        let mut batched = Message::new();
        batched.add_bcc_all(vec!["a".to_owned()]).add_bcc_all(["b", "c"]);

        assert_eq!(one_by_one.bcc(), batched.bcc());
    }

    #[test]
    fn empty_sequence_is_noop() {
        let mut message = Message::new();
        message.add_to("x@y.com");
        message.add_to_all(Vec::<String>::new());
        assert_eq!(message.to(), ["x@y.com"]);
    }

    #[test]
    fn recipient_lists_are_independent() {
        let mut message = Message::new();
        message
            .add_cc("cc@example.com")
            .add_reply_to_all(["r1@example.com", "r2@example.com"]);
        assert!(message.to().is_empty());
        assert!(message.bcc().is_empty());
        assert_eq!(message.cc(), ["cc@example.com"]);
        assert_eq!(message.reply_to(), ["r1@example.com", "r2@example.com"]);
    }

    #[test]
    fn scalar_setters_keep_last_value() {
        let mut message = Message::new();
        message
            .set_from("first@example.com")
            .set_from("second@example.com")
            .set_return_path("bounce1@example.com")
            .set_return_path("bounce2@example.com")
            .set_subject("one")
            .set_subject("two")
            .set_subject_charset("ISO-8859-1")
            .set_subject_charset("UTF-8");
        assert_eq!(message.from(), Some("second@example.com"));
        assert_eq!(message.return_path(), Some("bounce2@example.com"));
        assert_eq!(message.subject(), Some("two"));
        assert_eq!(message.subject_charset(), Some("UTF-8"));
    }

    #[test]
    fn setters_store_empty_strings_as_given() {
        let mut message = Message::new();
        message.set_subject("").set_from("");
        assert_eq!(message.subject(), Some(""));
        assert_eq!(message.from(), Some(""));
    }

    #[test]
    fn message_from_string_sets_both_bodies() {
        let mut message = Message::new();
        message.set_message_from_string("hello", Some("<b>hi</b>"));
        assert_eq!(message.message_text(), Some("hello"));
        assert_eq!(message.message_html(), Some("<b>hi</b>"));

        message.set_message_from_string("hello", None);
        assert_eq!(message.message_text(), Some("hello"));
        assert!(message.message_html().is_none());
    }

    #[test]
    fn charset_does_not_touch_bodies() {
        let mut message = Message::new();
        message.set_message_from_string("hello", Some("<b>hi</b>"));
        message.set_message_charset("UTF-8", Some("ISO-8859-1"));
        assert_eq!(message.message_text(), Some("hello"));
        assert_eq!(message.message_html(), Some("<b>hi</b>"));
        assert_eq!(message.message_text_charset(), Some("UTF-8"));
        assert_eq!(message.message_html_charset(), Some("ISO-8859-1"));

        message.set_message_charset("US-ASCII", None);
        assert_eq!(message.message_text_charset(), Some("US-ASCII"));
        assert!(message.message_html_charset().is_none());
    }

    #[test]
    fn bodies_do_not_touch_charsets() {
        let mut message = Message::new();
        message.set_message_charset("UTF-8", Some("UTF-8"));
        message.set_message_from_string("text", None);
        assert_eq!(message.message_html_charset(), Some("UTF-8"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreadable_regular_file_clears_that_side() {
        // A regular file whose read fails with EIO.
        let unreadable = Path::new("/proc/self/mem");
        if std::fs::read(unreadable).is_ok() {
            return;
        }
        let text = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(text.path(), "text").unwrap();

        let mut message = Message::new();
        message.set_message_from_string("old", Some("<p>old</p>"));
        message.set_message_from_file(text.path(), Some(unreadable));
        assert_eq!(message.message_text(), Some("text"));
        assert!(message.message_html().is_none());

        message.set_message_from_file(unreadable, Some(text.path()));
        assert!(message.message_text().is_none());
        assert_eq!(message.message_html(), Some("text"));
    }

    #[test]
    fn message_from_url_without_locators_fetches_nothing() {
        let fetcher = RecordingFetcher::default();
        let mut message = Message::new();
        message.set_message_from_string("old", Some("<p>old</p>"));
        message
            .set_message_from_url_with(&fetcher, None, None)
            .unwrap();
        assert!(message.message_text().is_none());
        assert!(message.message_html().is_none());
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn default_message_from_url_without_locators_clears_bodies() {
        let mut message = Message::new();
        message.set_message_from_string("old", Some("<p>old</p>"));
        message.set_message_from_url(None, None).unwrap();
        assert!(message.message_text().is_none());
        assert!(message.message_html().is_none());
    }

    #[test]
    fn message_from_url_fetches_each_present_locator() {
        let fetcher = RecordingFetcher::default();
        let mut message = Message::new();
        message
            .set_message_from_url_with(&fetcher, None, Some("https://cdn/body.html"))
            .unwrap();
        assert!(message.message_text().is_none());
        assert_eq!(
            message.message_html(),
            Some("content of https://cdn/body.html")
        );
        assert_eq!(*fetcher.calls.lock().unwrap(), ["https://cdn/body.html"]);
    }

    #[test]
    fn failed_fetch_leaves_message_unchanged() {
        let fetcher = RecordingFetcher {
            fail_on: Some("https://cdn/body.html"),
            ..RecordingFetcher::default()
        };
        let mut message = Message::new();
        message.set_message_from_string("keep", Some("<p>keep</p>"));
        let before = message.clone();

        let err = message
            .set_message_from_url_with(
                &fetcher,
                Some("https://cdn/body.txt"),
                Some("https://cdn/body.html"),
            )
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(message, before);
    }

    #[test]
    fn validate_requires_recipient() {
        let mut message = Message::new();
        message.set_from("a@b.com").set_subject("hi");
        assert!(!message.validate());
        assert_eq!(message.check(), Err(ValidationError::NoRecipients));
    }

    #[test]
    fn validate_requires_sender() {
        let mut message = Message::new();
        message.add_to("x@y.com").set_subject("hi");
        assert!(!message.validate());
        assert_eq!(message.check(), Err(ValidationError::NoSender));

        message.set_from("");
        assert_eq!(message.check(), Err(ValidationError::NoSender));
    }

    #[test]
    fn validate_requires_some_content() {
        let mut message = sendable();
        message.set_subject("");
        assert!(!message.validate());
        assert_eq!(message.check(), Err(ValidationError::NoContent));

        message.set_message_from_string("", Some(""));
        assert_eq!(message.check(), Err(ValidationError::NoContent));
    }

    #[test]
    fn validate_accepts_body_without_subject() {
        let mut message = sendable();
        message.set_message_from_string("body", None);
        assert!(message.validate());
    }

    #[test]
    fn validate_accepts_html_only() {
        let mut message = sendable();
        message.set_message_from_string("", Some("<p>x</p>"));
        assert!(message.validate());
    }

    #[test]
    fn validate_ignores_secondary_fields() {
        let mut message = sendable();
        message
            .set_subject("hi")
            .add_cc("")
            .set_return_path("")
            .set_subject_charset("");
        assert!(message.validate());
    }

    #[test]
    fn serializes_without_absent_fields() {
        let mut message = sendable();
        message.set_subject("hi");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "to": ["x@y.com"],
                "cc": [],
                "bcc": [],
                "reply_to": [],
                "from": "a@b.com",
                "subject": "hi"
            })
        );
    }
}
