//! Reconciliation engine: converges remote cost-center membership toward
//! the state implied by team membership.
//!
//! A run flows through four phases, data moving strictly downward:
//!
//! 1. [`builder::DesiredStateBuilder`] — enumerate teams, resolve each to a
//!    cost-center name, fold members into one assignment per user
//!    (last team processed wins).
//! 2. [`ids::IdResolver`] — turn cost-center names into stable ids with a
//!    single preload call plus create-or-find fallback.
//! 3. [`syncer::AssignmentSyncer`] — add missing members in batches of at
//!    most 50, tracking a per-user outcome.
//! 4. [`drift::DriftRemover`] — detect (and optionally remove) members who
//!    left their team since the last run.
//!
//! [`run::SyncRun`] glues the phases together for plan and apply modes.
//! Every phase talks to the remote system only through the `tally-core`
//! capability traits, so the whole engine runs against in-memory doubles
//! in tests.

pub mod budgets;
pub mod builder;
pub mod drift;
pub mod error;
pub mod ids;
pub mod report;
pub mod resolver;
pub mod run;
pub mod syncer;

pub use budgets::BudgetManager;
pub use builder::{DesiredState, DesiredStateBuilder};
pub use drift::{DriftRemover, DriftReport};
pub use error::{SyncError, SyncResult};
pub use ids::{IdResolution, IdResolver};
pub use report::{RunReport, SyncSummary};
pub use resolver::NameResolver;
pub use run::SyncRun;
pub use syncer::AssignmentSyncer;
