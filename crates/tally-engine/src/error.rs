//! Engine error types.

use thiserror::Error;

use tally_core::ApiError;

/// Result type alias using [`SyncError`].
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a phase (or the whole run).
///
/// Per-user and per-cost-center failures are not errors: they are folded
/// into the run's outcome maps as `false`. What surfaces here is either a
/// configuration problem, an unreachable collaborator, or a name that can
/// never resolve.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator call failed terminally.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A cost-center name triggered a create conflict but no cost center
    /// with that name exists in any state.
    #[error("no cost center found with name {name:?} despite create conflict")]
    CostCenterNotFound { name: String },

    /// The only cost center with this name is deleted/inactive. Terminal
    /// for the name: deleted cost centers cannot receive assignments and
    /// must be recreated or reactivated out of band.
    #[error("cost center {name:?} exists but is in state {state:?} and cannot receive assignments")]
    CostCenterInactive { name: String, state: String },
}
