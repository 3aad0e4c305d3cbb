//! Common test utilities for tally-github integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use tally_github::GithubClient;

pub const ENTERPRISE: &str = "test-enterprise";

/// Builds a client pointed at a mock server.
pub fn test_client(server: &MockServer) -> GithubClient {
    GithubClient::new(server.uri(), ENTERPRISE, "test-token").unwrap()
}

/// Test data factory for a team entry.
pub fn team(name: &str, slug: &str) -> Value {
    json!({ "name": name, "slug": slug, "id": 1 })
}

/// Test data factory for a team member entry.
pub fn member(login: &str) -> Value {
    json!({ "login": login, "id": 1 })
}

/// Test data factory for a cost center entry.
pub fn cost_center(id: &str, name: &str, state: &str) -> Value {
    json!({ "id": id, "name": name, "state": state })
}

/// Test data factory for the cost-center list envelope.
pub fn cost_centers_body(centers: &[Value]) -> Value {
    json!({ "costCenters": centers })
}
