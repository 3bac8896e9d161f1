//! Terminal prompts with inquire → stdin fallback.
//!
//! Every prompt degrades gracefully: if `inquire` cannot drive the terminal
//! (e.g. input is piped), it falls back to plain stdin prompts. Esc and
//! Ctrl-C map to [`Error::Cancelled`].

use inquire::{Confirm, InquireError, Password, Select, Text};
use lhub_core::{Error, Prompter, Result, SecureString};
use std::io::{self, BufRead, Write};

/// [`Prompter`] backed by the user's terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

/// Read a trimmed line from stdin. End of input counts as a cancel.
fn read_line() -> Result<String> {
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| Error::Prompt(format!("Failed to read input: {}", e)))?;
    if read == 0 {
        return Err(Error::Cancelled);
    }
    Ok(input.trim().to_string())
}

fn flush() -> Result<()> {
    io::stdout()
        .flush()
        .map_err(|e| Error::Prompt(format!("Failed to write prompt: {}", e)))
}

/// `Some(err)` when the user aborted, `None` when the fallback should run
fn aborted(err: &InquireError) -> Option<Error> {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            Some(Error::Cancelled)
        }
        _ => None,
    }
}

/// Yes/no prompt with fallback
pub fn confirm(message: &str, default: bool) -> Result<bool> {
    match Confirm::new(message).with_default(default).prompt() {
        Ok(v) => Ok(v),
        Err(e) => {
            if let Some(err) = aborted(&e) {
                return Err(err);
            }
            let hint = if default { "Y/n" } else { "y/N" };
            print!("? {} ({}) ", message, hint);
            flush()?;
            let input = read_line()?;
            match input.to_lowercase().as_str() {
                "y" | "yes" => Ok(true),
                "n" | "no" => Ok(false),
                _ => Ok(default),
            }
        }
    }
}

/// Multi-line text read until an empty line, joined with spaces
pub fn multi_line(message: &str) -> Result<String> {
    println!("{}", message);
    let mut collected: Vec<String> = Vec::new();
    loop {
        let line = match read_line() {
            Ok(line) => line,
            Err(Error::Cancelled) if !collected.is_empty() => break,
            Err(e) => return Err(e),
        };
        if line.is_empty() {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        collected.push(line);
    }
    Ok(collected.join(" "))
}

impl Prompter for TerminalPrompter {
    fn ask_text(&self, message: &str) -> Result<String> {
        match Text::new(message).prompt() {
            Ok(v) => Ok(v),
            Err(e) => {
                if let Some(err) = aborted(&e) {
                    return Err(err);
                }
                print!("{}", message);
                flush()?;
                read_line()
            }
        }
    }

    fn ask_secret(&self, message: &str) -> Result<SecureString> {
        match Password::new(message)
            .with_display_mode(inquire::PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
        {
            Ok(v) => Ok(SecureString::from(v)),
            Err(e) => {
                if let Some(err) = aborted(&e) {
                    return Err(err);
                }
                print!("{}", message);
                flush()?;
                read_line().map(SecureString::from)
            }
        }
    }

    fn ask_choice(&self, message: &str, options: &[&str]) -> Result<usize> {
        match Select::new(message, options.to_vec()).raw_prompt() {
            Ok(choice) => Ok(choice.index),
            Err(e) => {
                if let Some(err) = aborted(&e) {
                    return Err(err);
                }
                println!();
                for (i, opt) in options.iter().enumerate() {
                    println!("  [{}] {}", i + 1, opt);
                }
                loop {
                    print!("{} ", message);
                    flush()?;
                    let input = read_line()?;
                    if let Ok(n) = input.parse::<usize>() {
                        if (1..=options.len()).contains(&n) {
                            return Ok(n - 1);
                        }
                    }
                    println!("  (enter a number from 1 to {})", options.len());
                }
            }
        }
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        confirm(message, default)
    }
}
