//! Team and team-membership listing for both scopes.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use tally_core::{ApiResult, Team, TeamDirectory, TeamSource};

use crate::client::GithubClient;

/// Member entry as returned by both membership endpoints.
#[derive(Debug, Deserialize)]
struct Member {
    #[serde(default)]
    login: String,
}

impl GithubClient {
    fn teams_url(&self, source: &TeamSource) -> String {
        match source {
            TeamSource::Enterprise(_) => self.enterprise_url("/teams"),
            TeamSource::Organization(org) => self.url(&format!("/orgs/{org}/teams")),
        }
    }

    fn members_url(&self, source: &TeamSource, team_slug: &str) -> String {
        match source {
            // Enterprise teams expose membership under /memberships and
            // return user objects directly.
            TeamSource::Enterprise(_) => {
                self.enterprise_url(&format!("/teams/{team_slug}/memberships"))
            }
            TeamSource::Organization(org) => {
                self.url(&format!("/orgs/{org}/teams/{team_slug}/members"))
            }
        }
    }
}

#[async_trait]
impl TeamDirectory for GithubClient {
    async fn list_teams(&self, source: &TeamSource) -> ApiResult<Vec<Team>> {
        info!(source = source.label(), name = source.name(), "fetching teams");
        let teams: Vec<Team> = self.get_paginated(&self.teams_url(source)).await?;
        info!(source = source.label(), name = source.name(), count = teams.len(), "found teams");
        Ok(teams)
    }

    async fn list_team_members(
        &self,
        source: &TeamSource,
        team_slug: &str,
    ) -> ApiResult<Vec<String>> {
        let members: Vec<Member> = self
            .get_paginated(&self.members_url(source, team_slug))
            .await?;

        // Deduplicate while preserving remote order; drop entries without a
        // login.
        let mut seen = HashSet::new();
        let logins: Vec<String> = members
            .into_iter()
            .filter(|m| !m.login.is_empty())
            .filter(|m| seen.insert(m.login.clone()))
            .map(|m| m.login)
            .collect();

        debug!(team = team_slug, count = logins.len(), "fetched team members");
        Ok(logins)
    }
}
