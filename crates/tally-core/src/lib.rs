//! Shared foundation for the tally cost-center synchronizer.
//!
//! This crate holds what every other tally crate agrees on:
//!
//! - the domain types exchanged between the billing client and the
//!   reconciliation engine ([`types`]),
//! - the capability traits the engine consumes — a team directory, a
//!   cost-center store, and a budget store ([`traits`]),
//! - the shared API error taxonomy ([`error`]),
//! - the typed configuration surface ([`config`]).
//!
//! The engine never talks to a concrete HTTP client; it only sees the
//! traits defined here, which keeps every phase testable against
//! in-memory doubles.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    BudgetsConfig, NamingMode, ProductBudget, RunMode, SyncConfig, TeamScope, TeamsConfig,
};
pub use error::{ApiError, ApiResult};
pub use traits::{BudgetStore, CostCenterStore, TeamDirectory};
pub use types::{BudgetOutcome, CostCenter, CostCenterRef, Team, TeamSource, UserAssignment};
