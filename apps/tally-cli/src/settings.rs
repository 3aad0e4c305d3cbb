//! Config-file loading and token resolution.

use std::path::Path;

use tally_core::SyncConfig;

use crate::error::{CliError, CliResult};

/// Loads and validates the sync configuration from a TOML file.
pub fn load_config(path: &str) -> CliResult<SyncConfig> {
    let path = Path::new(path);
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: SyncConfig = toml::from_str(&raw)
        .map_err(|e| CliError::Config(format!("invalid config file {}: {e}", path.display())))?;

    config.validate()?;
    Ok(config)
}

/// Resolves the API token from the environment.
///
/// `GITHUB_TOKEN` is preferred (set by the gh CLI for extensions),
/// `GH_TOKEN` is the fallback.
pub fn resolve_token() -> CliResult<String> {
    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = std::env::var(var) {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
    }
    Err(CliError::MissingToken)
}
