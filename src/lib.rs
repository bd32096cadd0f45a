#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate lazy_static;

use camino::Utf8PathBuf;
use std::path::PathBuf;

pub mod auth;
pub mod cache;
pub mod client;
pub use client::{ApiClient, FetchPolicy};
pub mod commands;
pub use commands::Cli;
pub mod config;
pub use config::Config;
pub(crate) mod error;
pub use error::{Error, Result};
pub mod forms;
pub mod model;
pub use model::{Client, ClientInput, DashboardData, Goal, GoalInput};
pub mod operation;
pub use operation::Operation;
pub mod pagination;
pub use pagination::PaginationInfo;
pub mod resources;
pub mod router;
pub use router::{NameRouter, Service};
pub mod search;
pub(crate) mod serializers;
pub mod session;
pub use session::{SessionManager, SessionState};
pub mod state;
pub use state::State;
pub mod transport;

/// Falls back to the working directory when the platform has no such directory or it is not
/// valid UTF-8.
fn platform_dir(dir: Option<PathBuf>) -> Utf8PathBuf {
    dir.and_then(|dir| Utf8PathBuf::try_from(dir).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

lazy_static! {
    pub static ref CONFIG_FILE_PATH: Utf8PathBuf =
        platform_dir(dirs::config_dir()).join("client-goals.yaml");
    pub static ref STATE_DIR: Utf8PathBuf = platform_dir(dirs::cache_dir()).join("client-goals");
    pub static ref SESSION_FILE_PATH: Utf8PathBuf = STATE_DIR.join("session.yaml");
}
