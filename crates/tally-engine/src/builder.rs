//! Desired-state computation from team membership.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use tally_core::{SyncConfig, TeamDirectory, TeamSource, UserAssignment};

use crate::error::SyncResult;
use crate::resolver::NameResolver;

/// How many multi-team users are listed individually in the conflict
/// report before the rest are summarized.
const CONFLICT_REPORT_LIMIT: usize = 10;

/// The assignment state a run converges the remote store toward.
#[derive(Debug, Default)]
pub struct DesiredState {
    /// Cost-center name → the users assigned to it, sorted by username.
    pub assignments: BTreeMap<String, Vec<UserAssignment>>,
    /// Username → every team key the user was seen in, for users seen in
    /// more than one team. Reporting only; the winning assignment is
    /// already folded into `assignments`.
    pub multi_team_users: BTreeMap<String, Vec<String>>,
    /// Total teams enumerated across all sources.
    pub total_teams: usize,
}

impl DesiredState {
    /// Target cost-center names in sorted order.
    #[must_use]
    pub fn cost_center_names(&self) -> Vec<String> {
        self.assignments.keys().cloned().collect()
    }

    /// Number of users holding an assignment.
    #[must_use]
    pub fn unique_users(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Builds the desired assignment state by walking every team in scope.
///
/// Holds the per-run caches (team-key → members, team-key → cost-center
/// name); construct one per run and discard it afterwards.
pub struct DesiredStateBuilder<'a, D: TeamDirectory> {
    directory: &'a D,
    sources: Vec<TeamSource>,
    resolver: NameResolver,
    members_cache: HashMap<String, Vec<String>>,
}

impl<'a, D: TeamDirectory> DesiredStateBuilder<'a, D> {
    #[must_use]
    pub fn new(config: &SyncConfig, directory: &'a D) -> Self {
        Self {
            directory,
            sources: config.team_sources(),
            resolver: NameResolver::new(config.teams.mode, config.teams.mappings.clone()),
            members_cache: HashMap::new(),
        }
    }

    /// Computes one assignment per user.
    ///
    /// Teams are processed in the order sources are configured and the
    /// remote returns them; when a user belongs to several teams the last
    /// processed team wins, deterministically. A team whose member fetch
    /// fails is skipped with a logged error; an unreachable team listing
    /// aborts the run.
    pub async fn build(&mut self) -> SyncResult<DesiredState> {
        info!("building team-based cost center assignments");

        let mut state = DesiredState::default();

        // username → winning assignment. BTreeMap so the inversion below
        // is deterministic.
        let mut user_final: BTreeMap<String, UserAssignment> = BTreeMap::new();
        // username → all team keys seen, for conflict reporting.
        let mut user_teams: HashMap<String, Vec<String>> = HashMap::new();

        let sources = self.sources.clone();
        for source in &sources {
            let teams = self.directory.list_teams(source).await?;
            info!(
                source = source.label(),
                name = source.name(),
                count = teams.len(),
                "processing teams"
            );
            state.total_teams += teams.len();

            for team in &teams {
                let Some(cc_name) = self.resolver.resolve(source, team) else {
                    debug!(team = %team.slug, "skipping team (no cost center mapping)");
                    continue;
                };

                let members = match self.team_members(source, &team.slug).await {
                    Ok(members) => members,
                    Err(e) => {
                        warn!(
                            team = %source.team_key(&team.slug),
                            error = %e,
                            "failed to fetch team members, skipping team"
                        );
                        continue;
                    }
                };

                if members.is_empty() {
                    info!(team = %team.slug, "team has no members, skipping");
                    continue;
                }

                let team_key = source.team_key(&team.slug);
                for username in &members {
                    user_teams
                        .entry(username.clone())
                        .or_default()
                        .push(team_key.clone());
                    // Last team processed wins.
                    user_final.insert(
                        username.clone(),
                        UserAssignment {
                            username: username.clone(),
                            cost_center: cc_name.clone(),
                            org: source.name().to_string(),
                            team_slug: team.slug.clone(),
                        },
                    );
                }

                info!(
                    team = %team.name,
                    key = %team_key,
                    cost_center = %cc_name,
                    members = members.len(),
                    "team assignment"
                );
            }
        }

        report_multi_team_users(&user_teams, &user_final, &mut state);

        for assignment in user_final.into_values() {
            state
                .assignments
                .entry(assignment.cost_center.clone())
                .or_default()
                .push(assignment);
        }

        info!(
            cost_centers = state.assignments.len(),
            unique_users = state.unique_users(),
            "team assignment summary"
        );

        Ok(state)
    }

    /// Fetches the members of a team, memoized per team key for the run.
    async fn team_members(&mut self, source: &TeamSource, team_slug: &str) -> SyncResult<Vec<String>> {
        let key = source.team_key(team_slug);
        if let Some(cached) = self.members_cache.get(&key) {
            return Ok(cached.clone());
        }

        let members = self.directory.list_team_members(source, team_slug).await?;
        self.members_cache.insert(key, members.clone());
        Ok(members)
    }
}

/// Warn about users seen in more than one team, listing the first few.
fn report_multi_team_users(
    user_teams: &HashMap<String, Vec<String>>,
    user_final: &BTreeMap<String, UserAssignment>,
    state: &mut DesiredState,
) {
    for (user, teams) in user_teams {
        if teams.len() > 1 {
            state.multi_team_users.insert(user.clone(), teams.clone());
        }
    }

    if state.multi_team_users.is_empty() {
        return;
    }

    warn!(
        count = state.multi_team_users.len(),
        "users in multiple teams (last-team-wins)"
    );
    for (user, teams) in state.multi_team_users.iter().take(CONFLICT_REPORT_LIMIT) {
        let assigned_to = user_final
            .get(user)
            .map(|a| a.cost_center.as_str())
            .unwrap_or_default();
        warn!(
            user = %user,
            teams = %teams.join(", "),
            assigned_to = %assigned_to,
            "multi-team user"
        );
    }
    if state.multi_team_users.len() > CONFLICT_REPORT_LIMIT {
        warn!(
            remaining = state.multi_team_users.len() - CONFLICT_REPORT_LIMIT,
            "more multi-team users not shown"
        );
    }
}
