//! CLI error types.

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API token found. Set GITHUB_TOKEN or GH_TOKEN.")]
    MissingToken,

    #[error(transparent)]
    Api(#[from] tally_core::ApiError),

    #[error(transparent)]
    Sync(#[from] tally_engine::SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
