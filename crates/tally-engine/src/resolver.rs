//! Team → cost-center-name resolution.

use std::collections::HashMap;

use tracing::warn;

use tally_core::{NamingMode, Team, TeamSource};

/// Resolves the cost-center name for a team, caching per team key for the
/// duration of a run.
///
/// Manual mode consults an explicit `team key → name` table and skips
/// unmapped teams. Auto mode derives the name deterministically from the
/// scope and the team's display name, so repeated runs are idempotent.
#[derive(Debug)]
pub struct NameResolver {
    mode: NamingMode,
    mappings: HashMap<String, String>,
    cache: HashMap<String, String>,
}

impl NameResolver {
    #[must_use]
    pub fn new(mode: NamingMode, mappings: HashMap<String, String>) -> Self {
        Self {
            mode,
            mappings,
            cache: HashMap::new(),
        }
    }

    /// The cost-center name for a team, or `None` when the team has no
    /// mapping (manual mode only).
    pub fn resolve(&mut self, source: &TeamSource, team: &Team) -> Option<String> {
        let key = source.team_key(&team.slug);

        if let Some(name) = self.cache.get(&key) {
            return Some(name.clone());
        }

        let name = match self.mode {
            NamingMode::Manual => match self.mappings.get(&key) {
                Some(name) => name.clone(),
                None => {
                    warn!(
                        team = %key,
                        hint = "add a mapping to teams.mappings",
                        "no mapping found for team in manual mode"
                    );
                    return None;
                }
            },
            NamingMode::Auto => match source {
                TeamSource::Enterprise(_) => format!("[enterprise team] {}", team.name),
                TeamSource::Organization(org) => format!("[org team] {org}/{}", team.name),
            },
        };

        self.cache.insert(key, name.clone());
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str, slug: &str) -> Team {
        Team {
            name: name.into(),
            slug: slug.into(),
        }
    }

    #[test]
    fn auto_org_template() {
        let mut resolver = NameResolver::new(NamingMode::Auto, HashMap::new());
        let source = TeamSource::Organization("my-org".into());

        let name = resolver.resolve(&source, &team("backend-team", "backend-team"));
        assert_eq!(name.as_deref(), Some("[org team] my-org/backend-team"));
    }

    #[test]
    fn auto_enterprise_template_uses_display_name() {
        let mut resolver = NameResolver::new(NamingMode::Auto, HashMap::new());
        let source = TeamSource::Enterprise("test-enterprise".into());

        let name = resolver.resolve(&source, &team("Platform Engineers", "platform-engineers"));
        assert_eq!(name.as_deref(), Some("[enterprise team] Platform Engineers"));
    }

    #[test]
    fn manual_hit_and_miss() {
        let mappings = HashMap::from([("my-org/devs".to_string(), "Engineering CC".to_string())]);
        let mut resolver = NameResolver::new(NamingMode::Manual, mappings);
        let source = TeamSource::Organization("my-org".into());

        assert_eq!(
            resolver.resolve(&source, &team("Developers", "devs")).as_deref(),
            Some("Engineering CC")
        );
        assert!(resolver.resolve(&source, &team("Unknown Team", "unknown")).is_none());
    }

    #[test]
    fn resolution_is_cached_per_team_key() {
        let mut resolver = NameResolver::new(NamingMode::Auto, HashMap::new());
        let source = TeamSource::Organization("my-org".into());

        let first = resolver.resolve(&source, &team("devs", "devs"));
        let second = resolver.resolve(&source, &team("devs", "devs"));
        assert_eq!(first, second);
        assert!(resolver.cache.contains_key("my-org/devs"));
    }

    #[test]
    fn resolution_is_pure_across_calls() {
        // Same team must produce the same name on every call, which is what
        // keeps re-syncs idempotent.
        let source = TeamSource::Enterprise("ent".into());
        let t = team("Data", "data");

        let mut a = NameResolver::new(NamingMode::Auto, HashMap::new());
        let mut b = NameResolver::new(NamingMode::Auto, HashMap::new());
        assert_eq!(a.resolve(&source, &t), b.resolve(&source, &t));
    }
}
