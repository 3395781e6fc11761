//! Providers command implementation.

use crate::error::Result;
use crate::output::Formatter;
use storyboard_llm::provider::KNOWN_PROVIDERS;

/// Execute the providers command.
pub fn execute_providers(formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_providers(&KNOWN_PROVIDERS)?);
    println!(
        "{}",
        formatter.info("Any other OpenAI-compatible relay: provider 'custom' with --url")
    );
    Ok(())
}
