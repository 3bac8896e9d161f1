//! Result rows shared by every listing: column selection and sorting

use crate::error::ActionError;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::str::FromStr;

/// One output row; keys keep insertion order
pub type Row = Map<String, Value>;

/// Column every listing starts with
pub const CONNECTION_NAME: &str = "connection name";

/// Optional column with the instance host
pub const HOSTNAME: &str = "hostname";

static NULL: Value = Value::Null;

/// One sort column. `-name` on the command line sorts descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Column name
    pub name: String,
    /// Sort descending
    pub reverse: bool,
}

impl SortKey {
    /// Ascending key
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reverse: false,
        }
    }

    /// Descending key
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reverse: true,
        }
    }
}

impl FromStr for SortKey {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, reverse) = match s.strip_prefix('-') {
            Some(rest) => (rest.trim(), true),
            None => (s, false),
        };
        if name.is_empty() {
            return Err(ActionError::InvalidInput(format!(
                "Invalid sort key: {:?}",
                s
            )));
        }
        Ok(Self {
            name: name.to_string(),
            reverse,
        })
    }
}

/// Shared options for user and command listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Add a `hostname` column after `connection name`
    pub show_hostname: bool,
    /// Columns to keep; empty keeps all
    pub attributes: Vec<String>,
    /// Sort keys; empty uses the listing's default order
    pub sort: Vec<SortKey>,
    /// Include deleted and disabled entries
    pub include_inactive: bool,
}

/// Split a comma separated list, dropping blanks. `*` alone means "all" and
/// yields an empty list.
pub fn split_list(value: &str) -> Vec<String> {
    if value.trim() == "*" {
        return Vec::new();
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Order two cells: null, booleans, numbers, strings, then anything else by
/// its JSON text
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Stable multi-key sort; a missing column sorts as null
pub fn sort_rows(rows: &mut [Row], keys: &[SortKey]) {
    rows.sort_by(|a, b| {
        for key in keys {
            let left = a.get(&key.name).unwrap_or(&NULL);
            let right = b.get(&key.name).unwrap_or(&NULL);
            let ord = compare_values(left, right);
            let ord = if key.reverse { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Prefix `fields` with the stock columns and keep only required or
/// requested columns
pub(crate) fn shape_row(
    stock: &[(&str, Value)],
    fields: Row,
    required: &[&str],
    attributes: &[String],
) -> Row {
    let mut row: Row = stock
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect();
    for (key, value) in fields {
        let keep = attributes.is_empty()
            || required.contains(&key.as_str())
            || attributes.iter().any(|a| *a == key);
        if keep {
            row.insert(key, value);
        }
    }
    row
}

/// `connection name` and optionally `hostname` columns for a listing
pub(crate) fn stock_columns(
    connection_name: &str,
    hostname: &str,
    opts: &ListOptions,
) -> Vec<(&'static str, Value)> {
    let mut stock = vec![(CONNECTION_NAME, Value::from(connection_name))];
    if opts.show_hostname {
        stock.push((HOSTNAME, Value::from(hostname)));
    }
    stock
}

/// Sort keys from the options, or `default` when none were given
pub(crate) fn sort_keys_or(opts: &ListOptions, default: &[&str]) -> Vec<SortKey> {
    if opts.sort.is_empty() {
        default.iter().map(|k| SortKey::asc(*k)).collect()
    } else {
        opts.sort.clone()
    }
}
