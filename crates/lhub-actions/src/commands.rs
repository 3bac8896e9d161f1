//! Command listing and execution

use crate::error::{ActionError, Result};
use crate::rows::{shape_row, sort_keys_or, sort_rows, stock_columns, ListOptions, Row};
use lhub_client::{CommandSummary, LogicHubApi};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Fields the platform adds to every command result row
pub const HIDDEN_FIELDS: [&str; 2] = ["lhub_page_num", "lhub_id"];

const REQUIRED: [&str; 1] = ["name"];

/// Default sort order of command listings
pub const DEFAULT_SORT: [&str; 2] = ["connection name", "name"];

/// Column selection for [`run_command`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep only these fields, in this order
    pub fields: Vec<String>,
    /// Drop these fields in addition to the hidden ones
    pub drop: Vec<String>,
}

/// Rows returned by a command run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    /// Result rows
    pub rows: Vec<Row>,
    /// Column order from the result schema, hidden fields removed
    pub headers: Vec<String>,
    /// Warnings reported by the server
    pub warnings: Vec<String>,
}

/// Flatten a command summary into listing columns
pub fn command_row(command: &CommandSummary) -> Row {
    let mut row = Row::new();
    row.insert("name".into(), Value::from(command.name.clone()));
    row.insert("id".into(), command.id.map_or(Value::Null, Value::from));
    row.insert(
        "description".into(),
        command.description.clone().map_or(Value::Null, Value::from),
    );
    row.insert(
        "owner".into(),
        command.owner.clone().map_or(Value::Null, Value::from),
    );
    row
}

/// Commands of one instance as rows, prefixed with the connection name
pub async fn list_commands(
    api: &dyn LogicHubApi,
    connection_name: &str,
    opts: &ListOptions,
) -> Result<Vec<Row>> {
    let commands = api.list_commands().await?;
    debug!(instance = %connection_name, count = commands.len(), "Commands fetched");

    let stock = stock_columns(connection_name, api.hostname(), opts);
    let mut rows: Vec<Row> = commands
        .iter()
        .map(|c| shape_row(&stock, command_row(c), &REQUIRED, &opts.attributes))
        .collect();
    sort_rows(&mut rows, &sort_keys_or(opts, &DEFAULT_SORT));
    Ok(rows)
}

/// Parse `key=value` pairs into command parameters
pub fn parse_params<S: AsRef<str>>(pairs: &[S]) -> Result<Map<String, Value>> {
    let mut params = Map::new();
    for pair in pairs {
        let pair = pair.as_ref();
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                params.insert(key.to_string(), Value::from(value));
            }
            _ => {
                return Err(ActionError::InvalidInput(format!(
                    "Parameters must be key-value pairs. Invalid input: {}",
                    pair
                )))
            }
        }
    }
    Ok(params)
}

/// Run a command and tidy its rows.
///
/// Hidden platform fields are always dropped. When `fields` are given, each
/// row keeps only those; a row with none of them keeps every column and a
/// warning is logged.
pub async fn run_command(
    api: &dyn LogicHubApi,
    name: &str,
    params: &Map<String, Value>,
    opts: &RunOptions,
) -> Result<CommandResult> {
    let output = api.execute_command(name, params).await?;
    for warning in &output.warnings {
        warn!(command = %name, "Warning returned: {}", warning);
    }

    let dropped = |key: &str| HIDDEN_FIELDS.contains(&key) || opts.drop.iter().any(|d| d == key);
    let mut fell_back = false;

    let rows: Vec<Row> = output
        .rows
        .into_iter()
        .map(|fields| {
            let fields: Row = fields.into_iter().filter(|(k, _)| !dropped(k.as_str())).collect();
            if opts.fields.is_empty() {
                return fields;
            }
            let selected: Row = opts
                .fields
                .iter()
                .filter_map(|f| fields.get(f).map(|v| (f.clone(), v.clone())))
                .collect();
            if selected.is_empty() {
                fell_back = true;
                fields
            } else {
                selected
            }
        })
        .collect();

    if fell_back {
        warn!("None of the provided fields were found in the results. Returning all columns.");
    }

    let headers: Vec<String> = if !opts.fields.is_empty() && !fell_back {
        opts.fields
            .iter()
            .filter(|f| rows.iter().any(|r| r.contains_key(*f)))
            .cloned()
            .collect()
    } else {
        output
            .columns
            .into_iter()
            .filter(|c| !dropped(c.as_str()))
            .collect()
    };

    info!(command = %name, rows = rows.len(), "Command complete");
    Ok(CommandResult {
        rows,
        headers,
        warnings: output.warnings,
    })
}
