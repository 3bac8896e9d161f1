//! LHub Actions - convenience operations over a LogicHub session
//!
//! Every operation takes a [`LogicHubApi`](lhub_client::LogicHubApi) so it
//! runs the same against a live [`HttpSession`](lhub_client::HttpSession) or
//! an in-memory fake:
//!
//! - [`playbooks`]: export every playbook to a dated folder
//! - [`batches`]: rerun batches with an optional delay between calls, or
//!   the failed batches of a stream one at a time
//! - [`users`]: list, create and delete users
//! - [`commands`]: list and run commands
//! - [`cases`]: search and close cases
//! - [`notifications`]: turn off notification preferences
//! - [`bulk`]: connect to many instances at once and fan out a delete
//! - [`output`]: table, CSV and JSON rendering of result rows

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batches;
pub mod bulk;
pub mod cases;
pub mod commands;
pub mod error;
pub mod notifications;
pub mod output;
pub mod playbooks;
pub mod rows;
pub mod users;

#[cfg(test)]
mod testing;

pub use batches::{reprocess_error_batches, BatchPhase, ErrorBatchOptions};
pub use bulk::{connect_all, delete_user_everywhere, NamedSession};
pub use error::{ActionError, Result};
pub use output::{OutputFormat, RenderOptions, TableStyle};
pub use playbooks::{export_playbooks, ExportSummary};
pub use rows::{ListOptions, Row, SortKey};
pub use users::DeleteOutcome;
