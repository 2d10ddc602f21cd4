use std::path::PathBuf;

use clap::Args;
use sarasa_ses::{FetchConfig, HttpFetcher, Message};
use tracing::debug;

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// `To` recipient (repeatable).
    #[arg(long)]
    pub to: Vec<String>,
    /// `Cc` recipient (repeatable).
    #[arg(long)]
    pub cc: Vec<String>,
    /// `Bcc` recipient (repeatable).
    #[arg(long)]
    pub bcc: Vec<String>,
    /// `Reply-To` address (repeatable).
    #[arg(long)]
    pub reply_to: Vec<String>,
    /// Sender address.
    #[arg(long)]
    pub from: Option<String>,
    /// Bounce (`Return-Path`) address.
    #[arg(long)]
    pub return_path: Option<String>,
    /// Subject line.
    #[arg(long)]
    pub subject: Option<String>,
    /// Character set of the subject.
    #[arg(long)]
    pub subject_charset: Option<String>,
    /// Plain-text body.
    #[arg(long, conflicts_with_all = ["text_file", "html_file", "text_url", "html_url"])]
    pub text: Option<String>,
    /// HTML body.
    #[arg(long, requires = "text")]
    pub html: Option<String>,
    /// File holding the plain-text body.
    #[arg(long, conflicts_with_all = ["text_url", "html_url"])]
    pub text_file: Option<PathBuf>,
    /// File holding the HTML body.
    #[arg(long, requires = "text_file")]
    pub html_file: Option<PathBuf>,
    /// URL of the plain-text body.
    #[arg(long)]
    pub text_url: Option<String>,
    /// URL of the HTML body.
    #[arg(long)]
    pub html_url: Option<String>,
    /// Character set of the plain-text body.
    #[arg(long)]
    pub text_charset: Option<String>,
    /// Character set of the HTML body.
    #[arg(long, requires = "text_charset")]
    pub html_charset: Option<String>,
}

/// Build a [`Message`] from the parsed flags.
///
/// Only URL bodies can fail; unreadable body files just leave that body
/// empty.
pub fn build(args: &ComposeArgs, fetch_config: &FetchConfig) -> anyhow::Result<Message> {
    let mut message = Message::new();
    message
        .add_to_all(&args.to)
        .add_cc_all(&args.cc)
        .add_bcc_all(&args.bcc)
        .add_reply_to_all(&args.reply_to);

    if let Some(ref from) = args.from {
        message.set_from(from);
    }
    if let Some(ref return_path) = args.return_path {
        message.set_return_path(return_path);
    }
    if let Some(ref subject) = args.subject {
        message.set_subject(subject);
    }
    if let Some(ref charset) = args.subject_charset {
        message.set_subject_charset(charset);
    }

    if let Some(ref text) = args.text {
        message.set_message_from_string(text, args.html.as_deref());
    } else if let Some(ref text_file) = args.text_file {
        message.set_message_from_file(text_file, args.html_file.as_deref());
    } else if args.text_url.is_some() || args.html_url.is_some() {
        let fetcher = HttpFetcher::new(fetch_config.clone())?;
        message.set_message_from_url_with(
            &fetcher,
            args.text_url.as_deref(),
            args.html_url.as_deref(),
        )?;
    }

    if let Some(ref charset) = args.text_charset {
        message.set_message_charset(charset, args.html_charset.as_deref());
    }

    debug!(
        to = message.to().len(),
        cc = message.cc().len(),
        bcc = message.bcc().len(),
        "composed message"
    );
    Ok(message)
}
