//! Playbook export

use crate::error::{ActionError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Local, NaiveDate};
use lhub_client::{LogicHubApi, PlaybookExport, PlaybookSummary};
use lhub_core::SessionError;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{error, info};

/// Log file collecting every failed download in an export folder
pub const FAILURES_LOG: &str = "_FAILURES.log";

/// Errors recorded for one playbook that could not be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedExport {
    /// Playbook name
    pub name: String,
    /// One entry per reported error
    pub errors: Vec<String>,
}

/// Outcome of [`export_playbooks`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Folder the files were written to
    pub folder: PathBuf,
    /// Flow ids saved successfully
    pub exported: Vec<String>,
    /// Failures keyed by flow id
    pub failed: BTreeMap<String, FailedExport>,
}

impl ExportSummary {
    /// True when nothing failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Replace characters that are unsafe in file names with `_`
pub fn sanitize_file_name(name: &str) -> String {
    static UNSAFE: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = UNSAFE.get_or_init(|| Regex::new(r"[^\w\-()\[\] +]").ok());
    match pattern {
        Some(re) => re.replace_all(name, "_").into_owned(),
        None => name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || "_-()[] +".contains(c) {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    }
}

/// First `<parent>/<host>_<kind>_<date>_<n>` folder that is missing or empty
pub fn next_export_folder(parent: &Path, host: &str, kind: &str, date: NaiveDate) -> PathBuf {
    let stamp = date.format("%Y-%m-%d");
    let mut counter = 1u32;
    loop {
        let candidate = parent.join(format!("{}_{}_{}_{}", host, kind, stamp, counter));
        let in_use = std::fs::read_dir(&candidate)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if !in_use {
            return candidate;
        }
        counter += 1;
    }
}

/// Download every playbook into a new dated folder under `parent`.
///
/// Playbooks are fetched in id order, optionally only the first `limit`.
/// HTTP and decoding failures are recorded per playbook in the summary and
/// in `_FAILURES.log`; other remote errors abort the export.
pub async fn export_playbooks(
    api: &dyn LogicHubApi,
    parent: &Path,
    limit: Option<usize>,
) -> Result<ExportSummary> {
    let folder = next_export_folder(parent, api.hostname(), "flows", Local::now().date_naive());
    std::fs::create_dir_all(&folder).map_err(ActionError::io(&folder))?;
    info!(folder = %folder.display(), "Saving files");

    let mut playbooks: Vec<PlaybookSummary> = api.list_playbooks().await?;
    playbooks.sort_by(|a, b| a.id.cmp(&b.id));
    if let Some(limit) = limit {
        playbooks.truncate(limit);
    }

    let mut summary = ExportSummary {
        folder: folder.clone(),
        ..ExportSummary::default()
    };
    let total = playbooks.len();

    for (n, playbook) in playbooks.iter().enumerate() {
        let file_info = format!("{} of {}: {} ({})", n + 1, total, playbook.id, playbook.name);
        info!("{} - Downloading...", file_info);

        let errors = match api.export_playbook(&playbook.id).await {
            Ok(export) => match save_export(&export, &folder, &playbook.name) {
                Ok(path) => {
                    info!(path = %path.display(), "{} - Saved successfully", file_info);
                    summary.exported.push(playbook.id.clone());
                    continue;
                }
                Err(ActionError::Export(message)) => vec![message],
                Err(other) => return Err(other),
            },
            Err(SessionError::Http { status, body, .. }) => http_failure_messages(status, &body),
            Err(other) => return Err(other.into()),
        };

        let warning = format!("{} - Download FAILED", file_info);
        for message in &errors {
            let line = format!("{}: {}", warning, message);
            error!("{}", line);
            append_failure(&folder, &line)?;
        }
        summary
            .failed
            .entry(playbook.id.clone())
            .or_insert_with(|| FailedExport {
                name: playbook.name.clone(),
                errors: Vec::new(),
            })
            .errors
            .extend(errors);
    }

    info!(
        exported = summary.exported.len(),
        failed = summary.failed.len(),
        "Playbook export complete"
    );
    Ok(summary)
}

/// `errorType: message` for each error in the response body, or a generic
/// line with the status code
fn http_failure_messages(status: u16, body: &str) -> Vec<String> {
    let errors = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("errors").and_then(Value::as_array).cloned())
        .unwrap_or_default();

    if errors.is_empty() {
        return vec![format!("unknown failure (status code {})", status)];
    }

    errors
        .iter()
        .map(|e| {
            let kind = e.get("errorType").and_then(Value::as_str).unwrap_or("None");
            let message = match e.get("message") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            format!("{}: {}", kind, message)
        })
        .collect()
}

fn append_failure(folder: &Path, line: &str) -> Result<()> {
    let path = folder.join(FAILURES_LOG);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(ActionError::io(&path))?;
    writeln!(file, "{}", line).map_err(ActionError::io(&path))
}

/// Decode one export and write it as `<sanitized name>.<type>`
fn save_export(export: &PlaybookExport, folder: &Path, name: &str) -> Result<PathBuf> {
    let bytes = match export.file_type.as_str() {
        "json" | "zip" => STANDARD
            .decode(export.content_b64.trim())
            .map_err(|e| ActionError::Export(format!("invalid base64 content: {}", e)))?,
        other => {
            return Err(ActionError::Export(format!(
                "Unknown file type {:?}. You will need to download manually",
                other
            )))
        }
    };

    let data = if export.file_type == "json" {
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ActionError::Export(format!("invalid JSON content: {}", e)))?;
        pretty_json(&value)?.into_bytes()
    } else {
        bytes
    };

    let file_name = format!("{}.{}", sanitize_file_name(name), export.file_type);
    let path = folder.join(file_name);
    std::fs::write(&path, data).map_err(ActionError::io(&path))?;
    Ok(path)
}

/// JSON with four-space indentation
fn pretty_json(value: &Value) -> Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(value, &mut serializer)?;
    String::from_utf8(out).map_err(|e| ActionError::Export(e.to_string()))
}
