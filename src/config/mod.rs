pub mod types;

use std::path::Path;
use tracing::{info, warn};

use crate::common::EnhanceError;

pub use types::{
    GroupProfile, HealthCheckProfile, OverrideProfile, ProviderProfile, RouteRuleProfile,
    RoutingProfile,
};

/// Parse a YAML routing profile. An empty document yields the built-in
/// profile.
pub fn parse_profile(content: &str) -> Result<RoutingProfile, EnhanceError> {
    let profile: RoutingProfile = if content.trim().is_empty() {
        RoutingProfile::default()
    } else {
        serde_yml::from_str(content)?
    };
    profile.validate()?;
    Ok(profile)
}

pub fn load_profile(path: &str) -> Result<RoutingProfile, EnhanceError> {
    let content = std::fs::read_to_string(Path::new(path)).map_err(|e| {
        warn!(path, error = %e, "failed to read routing profile");
        e
    })?;
    let profile = parse_profile(&content)?;
    info!(
        path,
        providers = profile.providers.len(),
        groups = profile.groups.len(),
        rules = profile.rules.len(),
        "routing profile loaded"
    );
    Ok(profile)
}
