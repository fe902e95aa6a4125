//! Interactive deletion confirmation

use dialoguer::Confirm;
use janitor_core::{Error, Result};
use janitor_retention::Confirmer;

/// Asks on the terminal, defaulting to "no"
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| Error::Io(std::io::Error::other(e)))
    }
}
