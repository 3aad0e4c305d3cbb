//! GitHub Enterprise billing and directory client for tally.
//!
//! Implements the `tally-core` capability traits against the GitHub REST
//! API:
//!
//! - [`TeamDirectory`](tally_core::TeamDirectory) — enterprise and
//!   organization team listing plus team membership, with page-number
//!   pagination,
//! - [`CostCenterStore`](tally_core::CostCenterStore) — cost-center CRUD
//!   under `/enterprises/{slug}/settings/billing/cost-centers`,
//! - [`BudgetStore`](tally_core::BudgetStore) — the enterprise-optional
//!   budgets endpoint, surfacing 404 as the distinct
//!   budgets-unavailable signal.
//!
//! The transport retries transient server errors with exponential backoff
//! and sleeps through 429 responses until the advertised rate-limit reset,
//! so callers above this crate never see a retryable condition.

mod budgets;
mod client;
mod cost_centers;
mod directory;

pub use client::GithubClient;
