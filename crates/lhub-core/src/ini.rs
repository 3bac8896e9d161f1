//! Reader and writer for the sectioned `key = value` files under `~/.logichub`.
//!
//! The format is the ConfigObj dialect the credentials and preferences files
//! have always used:
//!
//! ```text
//! [prod]
//!     hostname = prod.logichub.example
//!     api_key = "bW9yZSBiYXNlNjQ="
//!
//! [staging]
//!     hostname = staging.logichub.example
//! ```
//!
//! Sections are written sorted by name with one blank line between them.
//! Values are quoted only when they would not survive a reload unquoted.

use std::collections::BTreeMap;
use std::fmt;

/// Parse failure with the 1-based line it happened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// What was wrong
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Ordered `key = value` pairs of one section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    /// Value stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, keeping its position if it already exists
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove `key`, returning its old value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Entries in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the section has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move `leading` keys to the front in the given order; others keep their
    /// relative order after them.
    pub fn reorder(&mut self, leading: &[&str]) {
        let rank = |key: &str| {
            leading
                .iter()
                .position(|k| *k == key)
                .unwrap_or(leading.len())
        };
        // sort_by_key is stable
        self.entries.sort_by_key(|(k, _)| rank(k));
    }
}

/// A whole file: sections keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: BTreeMap<String, Section>,
}

impl Document {
    /// Empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Section by name
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Mutable section by name
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    /// Section by name, created empty if missing
    pub fn entry(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_string()).or_default()
    }

    /// Replace or insert a whole section
    pub fn insert(&mut self, name: impl Into<String>, section: Section) {
        self.sections.insert(name.into(), section);
    }

    /// Drop a section
    pub fn remove(&mut self, name: &str) -> Option<Section> {
        self.sections.remove(name)
    }

    /// Whether a section exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Section names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Number of sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when there are no sections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Serialize in file form
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (idx, (name, section)) in self.sections.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for (key, value) in section.iter() {
                out.push_str("    ");
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(&quote(value));
                out.push('\n');
            }
        }
        out
    }
}

/// Parse file text into a [`Document`]
pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut doc = Document::new();
    let mut current: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let err = |message: String| ParseError {
            line: line_no,
            message,
        };
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            if line.starts_with("[[") {
                return Err(err("nested sections are not supported".to_string()));
            }
            let close = line
                .find(']')
                .ok_or_else(|| err("section header is missing ']'".to_string()))?;
            let rest = line[close + 1..].trim_start();
            if !(rest.is_empty() || rest.starts_with('#')) {
                return Err(err(format!("unexpected text after section header: {}", rest)));
            }
            let name = line[1..close].trim();
            if name.is_empty() {
                return Err(err("empty section name".to_string()));
            }
            if doc.contains(name) {
                return Err(err(format!("duplicate section [{}]", name)));
            }
            doc.insert(name, Section::default());
            current = Some(name.to_string());
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| err(format!("expected 'key = value', found {:?}", line)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(err("empty key".to_string()));
        }
        let Some(section_name) = current.as_deref() else {
            return Err(err(format!("key '{}' appears before any section", key)));
        };
        let value = unquote(value.trim()).map_err(err)?;

        let section = doc.entry(section_name);
        if section.get(key).is_some() {
            return Err(err(format!("duplicate key '{}' in [{}]", key, section_name)));
        }
        section.set(key, value);
    }

    Ok(doc)
}

/// Interpret a boolean-like value (`true/false/yes/no/on/off/1/0`)
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn unquote(value: &str) -> Result<String, String> {
    for delim in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(body) = value.strip_prefix(delim) {
            let end = body
                .find(delim)
                .ok_or_else(|| format!("unterminated quoted value: {}", value))?;
            let rest = body[end + delim.len()..].trim_start();
            if !(rest.is_empty() || rest.starts_with('#')) {
                return Err(format!("unexpected text after quoted value: {}", rest));
            }
            return Ok(body[..end].to_string());
        }
    }

    let unquoted = match value.find('#') {
        Some(idx) => &value[..idx],
        None => value,
    };
    Ok(unquoted.trim_end().to_string())
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.trim() != value
        || value.contains(['#', ',', '"', '\''])
}

/// Quote styles in order of preference
const DELIMITERS: [&str; 4] = ["\"", "'", "\"\"\"", "'''"];

/// First delimiter the value can be wrapped in and read back unchanged.
///
/// The reader stops at the first closing delimiter, so the value must not
/// contain it, and must not end with the quote character of a triple quote.
fn delimiter_for(value: &str) -> Option<&'static str> {
    DELIMITERS.into_iter().find(|delim| {
        !value.contains(delim) && (delim.len() == 1 || !value.ends_with(&delim[..1]))
    })
}

/// Check that `value` can be written to a file and read back unchanged
pub fn check_value(value: &str) -> Result<(), String> {
    if value.contains(['\n', '\r']) {
        return Err("cannot contain line breaks".to_string());
    }
    if needs_quotes(value) && delimiter_for(value).is_none() {
        return Err("cannot be quoted: it mixes both quote characters".to_string());
    }
    Ok(())
}

fn quote(value: &str) -> String {
    if !needs_quotes(value) {
        return value.to_string();
    }
    // Callers reject unquotable values with `check_value` first
    let delim = delimiter_for(value).unwrap_or("'''");
    format!("{delim}{value}{delim}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# managed by lhub
[prod]
    hostname = prod.example.com
    username = admin
    password = \"abc+/==\"

[dev]
hostname=dev.example.com   # inline comment
    verify_ssl = False
; old style comment
";

    #[test]
    fn test_parse_sample() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.names().collect::<Vec<_>>(), vec!["dev", "prod"]);

        let prod = doc.section("prod").unwrap();
        assert_eq!(prod.get("hostname"), Some("prod.example.com"));
        assert_eq!(prod.get("password"), Some("abc+/=="));

        let dev = doc.section("dev").unwrap();
        assert_eq!(dev.get("hostname"), Some("dev.example.com"));
        assert_eq!(parse_bool(dev.get("verify_ssl").unwrap()), Some(false));
    }

    #[test]
    fn test_render_layout() {
        let mut doc = Document::new();
        doc.entry("zeta").set("hostname", "z.example.com");
        let alpha = doc.entry("alpha");
        alpha.set("hostname", "a.example.com");
        alpha.set("verify_ssl", "False");

        assert_eq!(
            doc.render(),
            "[alpha]\n    hostname = a.example.com\n    verify_ssl = False\n\n[zeta]\n    hostname = z.example.com\n"
        );
    }

    #[test]
    fn test_awkward_values_survive_rewrite() {
        let values = [
            "",
            "  padded  ",
            "has # hash",
            "a,b",
            "say \"hi\"",
            "it's",
            "both ' and \" here",
            "ends with both '\"",
            "x\"\"\"y'z",
            "'''lead",
            "base64+/==",
        ];
        let mut doc = Document::new();
        let section = doc.entry("s");
        for (i, v) in values.iter().enumerate() {
            section.set(format!("k{}", i), *v);
        }

        let reparsed = parse(&doc.render()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_unquotable_values_rejected() {
        assert!(check_value("plain").is_ok());
        assert!(check_value("x\"\"\"y'z").is_ok());
        assert!(check_value("two\nlines").is_err());
        assert!(check_value("a\"\"\"b'").is_err());
        assert!(check_value("x'''y\"").is_err());
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let cases = [
            ("key = value\n", 1),
            ("[a]\n[[nested]]\n", 2),
            ("[a]\nno equals sign\n", 2),
            ("[a]\nk = 1\nk = 2\n", 3),
            ("[a]\n\n[a]\n", 3),
            ("[a]\nk = \"open\n", 2),
            ("[]\n", 1),
        ];
        for (text, line) in cases {
            let err = parse(text).unwrap_err();
            assert_eq!(err.line, line, "{text:?}: {err}");
        }
    }

    #[test]
    fn test_reorder_keeps_unknown_order() {
        let mut section = Section::default();
        section.set("custom_b", "2");
        section.set("password", "p");
        section.set("custom_a", "1");
        section.set("hostname", "h");

        section.reorder(&["hostname", "username", "password"]);
        let keys: Vec<_> = section.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["hostname", "password", "custom_b", "custom_a"]);
    }

    #[test]
    fn test_parse_bool() {
        for v in ["True", "yes", "ON", "1"] {
            assert_eq!(parse_bool(v), Some(true));
        }
        for v in ["false", "No", "off", "0"] {
            assert_eq!(parse_bool(v), Some(false));
        }
        assert_eq!(parse_bool("maybe"), None);
    }
}
