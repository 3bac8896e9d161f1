//! Rendering of result rows as tables, CSV or JSON

use crate::error::{ActionError, Result};
use crate::rows::{sort_rows, Row, SortKey};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use unicode_width::UnicodeWidthStr;

/// Header printed for an empty table
pub const NO_RESULTS: &str = "no results";

/// How rows are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// Comma separated values with a header line
    Csv,
    /// Compact JSON array
    Json,
    /// Indented JSON array
    JsonPretty,
}

impl OutputFormat {
    /// Every format, in the order shown in help text
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Csv,
        OutputFormat::Json,
        OutputFormat::JsonPretty,
        OutputFormat::Table,
    ];

    /// Name used on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json_pretty",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ActionError::InvalidInput(format!("{} is not a valid output type", s)))
    }
}

/// Border style of table output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// Header underlined with dashes
    #[default]
    Simple,
    /// No rules at all
    Plain,
    /// Full box drawn with `+`, `-` and `|`
    Grid,
    /// GitHub flavored markdown
    Github,
}

impl TableStyle {
    /// Every style
    pub const ALL: [TableStyle; 4] = [
        TableStyle::Github,
        TableStyle::Grid,
        TableStyle::Plain,
        TableStyle::Simple,
    ];

    /// Name used on the command line and in preferences
    pub fn as_str(self) -> &'static str {
        match self {
            TableStyle::Simple => "simple",
            TableStyle::Plain => "plain",
            TableStyle::Grid => "grid",
            TableStyle::Github => "github",
        }
    }
}

impl fmt::Display for TableStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStyle {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ActionError::InvalidInput(format!("{} is not a supported table format", s))
            })
    }
}

/// How to render one result set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Output format
    pub format: OutputFormat,
    /// Table style, used by [`OutputFormat::Table`]
    pub style: TableStyle,
    /// Columns to print, in order; `None` prints every column
    pub headers: Option<Vec<String>>,
    /// Sort applied before rendering
    pub sort: Vec<SortKey>,
    /// Also write the rendered text to this file
    pub file: Option<PathBuf>,
}

impl RenderOptions {
    /// Options for `format` with defaults elsewhere
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Set the table style
    #[must_use]
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Print only these columns, in this order
    #[must_use]
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        self.headers = (!headers.is_empty()).then_some(headers);
        self
    }

    /// Sort rows first
    #[must_use]
    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    /// Write the output to a file as well
    #[must_use]
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

/// Render rows to text
pub fn render(rows: &[Row], opts: &RenderOptions) -> Result<String> {
    let mut rows = rows.to_vec();
    sort_rows(&mut rows, &opts.sort);

    let headers = match &opts.headers {
        Some(headers) => headers.clone(),
        None => collect_headers(&rows),
    };

    match opts.format {
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let projected: Vec<Value> = rows
                .iter()
                .map(|row| Value::Object(project(row, &headers)))
                .collect();
            let text = if opts.format == OutputFormat::JsonPretty {
                serde_json::to_string_pretty(&projected)?
            } else {
                serde_json::to_string(&projected)?
            };
            Ok(text)
        }
        OutputFormat::Csv => Ok(render_csv(&rows, &headers)),
        OutputFormat::Table => Ok(render_table(&rows, &headers, opts.style)),
    }
}

/// Render rows and write them to the options' file, if any
pub fn emit(rows: &[Row], opts: &RenderOptions) -> Result<String> {
    let text = render(rows, opts)?;
    if let Some(path) = &opts.file {
        std::fs::write(path, format!("{}\n", text)).map_err(ActionError::io(path))?;
        tracing::info!(path = %path.display(), rows = rows.len(), "Output written");
    }
    Ok(text)
}

/// Keys of the first row, then any new keys from later rows
fn collect_headers(rows: &[Row]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    headers
}

fn project(row: &Row, headers: &[String]) -> Row {
    if headers.is_empty() {
        return row.clone();
    }
    headers
        .iter()
        .map(|h| (h.clone(), row.get(h).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn render_csv(rows: &[Row], headers: &[String]) -> String {
    fn escape(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    if headers.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.iter().map(|h| escape(h)).collect::<Vec<_>>().join(","));
    for row in rows {
        let line = headers
            .iter()
            .map(|h| escape(&cell(row.get(h))))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    lines.join("\n")
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

fn render_table(rows: &[Row], headers: &[String], style: TableStyle) -> String {
    let headers: Vec<String> = if headers.is_empty() {
        vec![NO_RESULTS.to_string()]
    } else {
        headers.to_vec()
    };

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| headers.iter().map(|h| cell(row.get(h))).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            body.iter()
                .map(|r| UnicodeWidthStr::width(r[i].as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(h.as_str())))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String], sep: &str, edge: bool| -> String {
        let joined = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join(sep);
        if edge {
            format!("| {} |", joined)
        } else {
            joined.trim_end().to_string()
        }
    };
    let rule = |fill: char, cross: &str, edge: bool| -> String {
        let dashes: Vec<String> = widths
            .iter()
            .map(|w| fill.to_string().repeat(if edge { w + 2 } else { *w }))
            .collect();
        if edge {
            format!("{}{}{}", cross, dashes.join(cross), cross)
        } else {
            dashes.join("  ")
        }
    };

    let mut out = Vec::with_capacity(body.len() + 4);
    match style {
        TableStyle::Simple => {
            out.push(line(&headers, "  ", false));
            out.push(rule('-', "", false));
            out.extend(body.iter().map(|r| line(r, "  ", false)));
        }
        TableStyle::Plain => {
            out.push(line(&headers, "  ", false));
            out.extend(body.iter().map(|r| line(r, "  ", false)));
        }
        TableStyle::Github => {
            out.push(line(&headers, " | ", true));
            out.push(rule('-', "|", true));
            out.extend(body.iter().map(|r| line(r, " | ", true)));
        }
        TableStyle::Grid => {
            out.push(rule('-', "+", true));
            out.push(line(&headers, " | ", true));
            out.push(rule('=', "+", true));
            for r in &body {
                out.push(line(r, " | ", true));
                out.push(rule('-', "+", true));
            }
        }
    }
    out.join("\n")
}
