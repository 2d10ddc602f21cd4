use std::fmt::Write as _;

use sarasa_ses::{FetchConfig, Message};

use super::compose::{self, ComposeArgs};
use crate::OutputFormat;

pub fn run(
    args: &ComposeArgs,
    fetch_config: &FetchConfig,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let message = compose::build(args, fetch_config)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&message)?);
        }
        OutputFormat::Text => {
            print!("{}", render(&message));
        }
    }

    if let Err(e) = message.check() {
        eprintln!("warning: {e}");
    }
    Ok(())
}

/// Render a message as `Header: value` lines followed by its bodies.
pub fn render(message: &Message) -> String {
    let mut out = String::new();
    for (name, list) in [
        ("To", message.to()),
        ("Cc", message.cc()),
        ("Bcc", message.bcc()),
        ("Reply-To", message.reply_to()),
    ] {
        if !list.is_empty() {
            let _ = writeln!(out, "{name}: {}", list.join(", "));
        }
    }

    for (name, value) in [
        ("From", message.from()),
        ("Return-Path", message.return_path()),
        ("Subject", message.subject()),
        ("Subject-Charset", message.subject_charset()),
        ("Text-Charset", message.message_text_charset()),
        ("Html-Charset", message.message_html_charset()),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "{name}: {value}");
        }
    }

    if let Some(text) = message.message_text() {
        let _ = write!(out, "\n--- text ---\n{text}\n");
    }
    if let Some(html) = message.message_html() {
        let _ = write!(out, "\n--- html ---\n{html}\n");
    }
    out
}
