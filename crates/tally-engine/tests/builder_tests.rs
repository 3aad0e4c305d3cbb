//! Desired-state builder properties: determinism, the one-cost-center
//! invariant, and partial-failure tolerance.

mod support;

use support::*;

use tally_engine::DesiredStateBuilder;

#[tokio::test]
async fn last_team_processed_wins() {
    let config = org_config(&["org1"]);
    let directory = MockDirectory::default()
        .with_team("org1", team("team-a", "team-a"), &["alice", "bob"])
        .with_team("org1", team("team-b", "team-b"), &["bob", "carol"]);

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();

    let cc_a = "[org team] org1/team-a";
    let cc_b = "[org team] org1/team-b";

    let users_in = |cc: &str| -> Vec<&str> {
        state.assignments[cc]
            .iter()
            .map(|a| a.username.as_str())
            .collect()
    };

    // bob was in both teams; team-b was processed last.
    assert_eq!(users_in(cc_a), vec!["alice"]);
    assert_eq!(users_in(cc_b), vec!["bob", "carol"]);

    let bob = state.assignments[cc_b]
        .iter()
        .find(|a| a.username == "bob")
        .unwrap();
    assert_eq!(bob.team_slug, "team-b");
    assert_eq!(bob.org, "org1");

    // bob is reported as a multi-team user with both team keys.
    assert_eq!(
        state.multi_team_users["bob"],
        vec!["org1/team-a".to_string(), "org1/team-b".to_string()]
    );
    assert!(!state.multi_team_users.contains_key("alice"));
}

#[tokio::test]
async fn every_user_appears_in_exactly_one_cost_center() {
    let config = org_config(&["org1", "org2"]);
    let directory = MockDirectory::default()
        .with_team("org1", team("devs", "devs"), &["alice", "bob", "carol"])
        .with_team("org1", team("ops", "ops"), &["bob", "dave"])
        .with_team("org2", team("data", "data"), &["carol", "erin"]);

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();

    let mut seen = std::collections::HashMap::new();
    for (cc, assignments) in &state.assignments {
        for assignment in assignments {
            *seen.entry(assignment.username.clone()).or_insert(0) += 1;
            assert_eq!(&assignment.cost_center, cc);
        }
    }
    for (user, count) in seen {
        assert_eq!(count, 1, "user {user} appears in {count} cost centers");
    }
    assert_eq!(state.unique_users(), 5);
}

#[tokio::test]
async fn building_twice_is_idempotent() {
    let config = org_config(&["org1"]);
    let directory = MockDirectory::default()
        .with_team("org1", team("devs", "devs"), &["alice", "bob"])
        .with_team("org1", team("ops", "ops"), &["bob"]);

    let first = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();
    let second = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();

    assert_eq!(first.assignments, second.assignments);
}

#[tokio::test]
async fn empty_team_list_yields_empty_state() {
    let config = org_config(&["org1"]);
    let directory = MockDirectory::default();

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();
    assert!(state.is_empty());
    assert_eq!(state.unique_users(), 0);
}

#[tokio::test]
async fn failed_member_fetch_skips_team_but_not_run() {
    let config = org_config(&["org1"]);
    let mut directory = MockDirectory::default()
        .with_team("org1", team("devs", "devs"), &["alice"])
        .with_team("org1", team("broken", "broken"), &["ghost"]);
    directory.failing_members.insert("org1/broken".into());

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();

    assert_eq!(state.assignments.len(), 1);
    assert!(state.assignments.contains_key("[org team] org1/devs"));
    assert_eq!(state.unique_users(), 1);
}

#[tokio::test]
async fn unreachable_team_listing_aborts_the_run() {
    let config = org_config(&["org1"]);
    let mut directory = MockDirectory::default();
    directory.failing_sources.insert("org1".into());

    assert!(DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .is_err());
}

#[tokio::test]
async fn teams_with_no_members_are_skipped() {
    let config = org_config(&["org1"]);
    let directory = MockDirectory::default()
        .with_team("org1", team("devs", "devs"), &["alice"])
        .with_team("org1", team("empty", "empty"), &[]);

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();
    assert_eq!(state.assignments.len(), 1);
    assert_eq!(state.total_teams, 2);
}

#[tokio::test]
async fn manual_mode_skips_unmapped_teams() {
    let mut config = org_config(&["org1"]);
    config.teams.mode = tally_core::NamingMode::Manual;
    config
        .teams
        .mappings
        .insert("org1/devs".into(), "Engineering CC".into());

    let directory = MockDirectory::default()
        .with_team("org1", team("devs", "devs"), &["alice"])
        .with_team("org1", team("unmapped", "unmapped"), &["bob"]);

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();

    assert_eq!(state.assignments.len(), 1);
    let assignments = &state.assignments["Engineering CC"];
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].username, "alice");
}

#[tokio::test]
async fn enterprise_scope_uses_bare_slug_keys_and_display_names() {
    let config = enterprise_config();
    let directory = MockDirectory::default().with_enterprise_team(
        "test-enterprise",
        team("Platform Engineers", "platform-engineers"),
        &["alice"],
    );

    let state = DesiredStateBuilder::new(&config, &directory)
        .build()
        .await
        .unwrap();

    assert!(state
        .assignments
        .contains_key("[enterprise team] Platform Engineers"));
}
