//! Scripted prompter and stub validator shared by unit tests

use crate::credentials::SecureString;
use crate::error::{Error, Result};
use crate::paths::StoreConfig;
use crate::prompt::Prompter;
use crate::session::{ConnectionParams, SessionError, SessionValidator};
use async_trait::async_trait;
use lhub_crypto::KeyOptions;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

/// Store config with small keys so tests stay fast
pub(crate) fn test_config(dir: &Path) -> StoreConfig {
    StoreConfig::new(dir).with_keys(KeyOptions::default().with_bits(1024))
}

#[derive(Debug)]
pub(crate) enum Answer {
    Text(&'static str),
    Secret(&'static str),
    Choice(usize),
    Confirm(bool),
}

/// Replays answers in order and records every question asked
#[derive(Default)]
pub(crate) struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub(crate) fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, message: &str) -> Result<Answer> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("unexpected prompt: {}", message)))
    }

    fn mismatch(message: &str, answer: Answer) -> Error {
        Error::Prompt(format!("prompt {:?} got scripted {:?}", message, answer))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_text(&self, message: &str) -> Result<String> {
        match self.next(message)? {
            Answer::Text(t) => Ok(t.to_string()),
            other => Err(Self::mismatch(message, other)),
        }
    }

    fn ask_secret(&self, message: &str) -> Result<SecureString> {
        match self.next(message)? {
            Answer::Secret(s) => Ok(SecureString::new(s)),
            other => Err(Self::mismatch(message, other)),
        }
    }

    fn ask_choice(&self, message: &str, options: &[&str]) -> Result<usize> {
        match self.next(message)? {
            Answer::Choice(i) if i < options.len() => Ok(i),
            other => Err(Self::mismatch(message, other)),
        }
    }

    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        match self.next(message)? {
            Answer::Confirm(b) => Ok(b),
            other => Err(Self::mismatch(message, other)),
        }
    }
}

/// Returns queued results, then succeeds; records each attempt
#[derive(Default)]
pub(crate) struct StubValidator {
    results: Mutex<VecDeque<std::result::Result<(), SessionError>>>,
    calls: Mutex<Vec<ConnectionParams>>,
}

impl StubValidator {
    pub(crate) fn failing_with(errors: Vec<SessionError>) -> Self {
        Self {
            results: Mutex::new(errors.into_iter().map(Err).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<ConnectionParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionValidator for StubValidator {
    async fn validate(&self, params: &ConnectionParams) -> std::result::Result<(), SessionError> {
        self.calls.lock().unwrap().push(params.clone());
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

pub(crate) fn ssl_error(host: &str) -> SessionError {
    SessionError::Ssl {
        host: host.to_string(),
        message: "certificate verify failed: self-signed certificate".to_string(),
    }
}
