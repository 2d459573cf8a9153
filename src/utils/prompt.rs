use std::io::{self, Write};

use job_ledger::Confirm;
use tracing::error;

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?; // Make sure the prompt is immediately displayed

        if io::stdin().read_line(&mut input)? == 0 {
            // stdin closed, nobody to ask
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// Asks recovery questions on the terminal, defaulting to yes.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        match prompt_confirm(question, Some(true)) {
            Ok(answer) => answer,
            Err(e) => {
                error!("Could not read answer: {}", e);
                false
            }
        }
    }
}
