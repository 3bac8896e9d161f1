//! LHub Client - authenticated HTTP sessions against LogicHub instances
//!
//! [`HttpSession::connect`] logs in with a stored profile (password login
//! with a session cookie, or an API token header) and implements
//! [`LogicHubApi`], the set of REST calls the CLI actions use.
//! [`HttpValidator`] plugs the same login into the credential store so new
//! profiles are checked before they are saved.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod endpoints;
pub mod error;
pub mod session;
pub mod settings;
pub mod types;
pub mod validator;

pub use api::LogicHubApi;
pub use error::{ClientError, Result};
pub use session::HttpSession;
pub use settings::ClientSettings;
pub use types::{
    Batch, CaseRow, CommandOutput, CommandSummary, Group, NewUser, PlaybookExport,
    PlaybookSummary, User, UserPreference,
};
pub use validator::HttpValidator;
