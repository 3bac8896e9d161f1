//! Interactive input seam used while creating connections

use crate::credentials::SecureString;
use crate::error::{Error, Result};

/// Terminal interaction needed by the credential store.
///
/// The CLI supplies an implementation backed by the terminal; tests supply a
/// scripted one. Every method may return [`Error::Cancelled`] when the user
/// aborts.
pub trait Prompter: Send + Sync {
    /// Ask for a line of visible text
    fn ask_text(&self, message: &str) -> Result<String>;

    /// Ask for a secret without echoing it
    fn ask_secret(&self, message: &str) -> Result<SecureString>;

    /// Ask the user to pick one of `options`, returning its index
    fn ask_choice(&self, message: &str, options: &[&str]) -> Result<usize>;

    /// Yes/no question
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

/// Prompter for headless use: every question fails with [`Error::InputRequired`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn ask_text(&self, message: &str) -> Result<String> {
        Err(Error::InputRequired(field_name(message)))
    }

    fn ask_secret(&self, message: &str) -> Result<SecureString> {
        Err(Error::InputRequired(field_name(message)))
    }

    fn ask_choice(&self, message: &str, _options: &[&str]) -> Result<usize> {
        Err(Error::InputRequired(field_name(message)))
    }

    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        Err(Error::InputRequired(field_name(message)))
    }
}

fn field_name(message: &str) -> String {
    message.trim().trim_end_matches([':', '?']).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_names_the_field() {
        let err = NonInteractive.ask_text("Hostname: ").unwrap_err();
        assert!(matches!(err, Error::InputRequired(ref f) if f == "Hostname"));

        let err = NonInteractive.confirm("Verify SSL?", true).unwrap_err();
        assert!(matches!(err, Error::InputRequired(ref f) if f == "Verify SSL"));
    }
}
