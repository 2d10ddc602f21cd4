use sarasa_ses::FetchConfig;

use super::compose::{self, ComposeArgs};
use crate::OutputFormat;

pub fn run(
    args: &ComposeArgs,
    fetch_config: &FetchConfig,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let message = compose::build(args, fetch_config)?;
    let result = message.check();

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "valid": result.is_ok(),
                "reason": result.err().as_ref().map(ToString::to_string),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => match result {
            Ok(()) => println!("Message is complete."),
            Err(e) => eprintln!("Message is incomplete: {e}"),
        },
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
