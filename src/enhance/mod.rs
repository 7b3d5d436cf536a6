//! Routing enhancement for Clash-style configs.
//!
//! The config arrives as a dynamic tree (the caller parses and serializes
//! it). An [`Enhancer`] injects the subscription providers, makes sure the
//! matching `select` groups exist, then points each proxy's `dialer-proxy`
//! at a group chosen by its name. Every step is idempotent.

mod groups;
mod providers;
pub mod router;

use std::sync::OnceLock;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::common::EnhanceError;
use crate::config::{self, GroupProfile, ProviderProfile, RoutingProfile};

pub use router::{ProxyRouter, RouteRule};

/// What one pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnhanceReport {
    pub providers_added: usize,
    pub groups_created: usize,
    pub groups_normalized: usize,
    pub proxies_routed: usize,
}

impl EnhanceReport {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.providers_added + self.groups_created + self.groups_normalized + self.proxies_routed
    }
}

/// A compiled [`RoutingProfile`].
#[derive(Debug, Clone)]
pub struct Enhancer {
    providers: Vec<ProviderProfile>,
    groups: Vec<GroupProfile>,
    router: ProxyRouter,
}

impl Enhancer {
    pub fn new(profile: &RoutingProfile) -> Result<Self, EnhanceError> {
        profile.validate()?;
        Ok(Self {
            providers: profile.providers.clone(),
            groups: profile.groups.clone(),
            router: ProxyRouter::compile(&profile.rules)?,
        })
    }

    /// Built-in profile, compiled once.
    pub fn builtin() -> Option<&'static Enhancer> {
        static BUILTIN: OnceLock<Option<Enhancer>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| match Enhancer::new(&RoutingProfile::default()) {
                Ok(enhancer) => Some(enhancer),
                Err(e) => {
                    error!(error = %e, "built-in routing profile rejected");
                    None
                }
            })
            .as_ref()
    }

    /// Load and compile a YAML profile file.
    pub fn from_profile_file(path: &str) -> Result<Self, EnhanceError> {
        let profile = config::load_profile(path)?;
        Self::new(&profile).inspect_err(|e| {
            warn!(path, subject = e.subject().unwrap_or_default(), "routing profile rejected");
        })
    }

    pub fn router(&self) -> &ProxyRouter {
        &self.router
    }

    /// Enhance `config` in place. Returns `None` when `config` is not a
    /// mapping, in which case it is left untouched.
    pub fn apply(&self, config: &mut Value) -> Option<EnhanceReport> {
        let Some(root) = config.as_object_mut() else {
            debug!("config is not a mapping, passing through");
            return None;
        };

        let mut report = EnhanceReport {
            providers_added: providers::ensure_providers(root, &self.providers),
            ..Default::default()
        };

        let changes = groups::ensure_groups(root, &self.groups);
        report.groups_created = changes.created;
        report.groups_normalized = changes.normalized;

        match root.get_mut("proxies") {
            Some(Value::Array(proxies)) => report.proxies_routed = self.router.route(proxies),
            Some(Value::Null) | None => {}
            Some(_) => debug!("proxies is not a sequence, skipping routing"),
        }

        if !report.is_empty() {
            info!(
                providers_added = report.providers_added,
                groups_created = report.groups_created,
                groups_normalized = report.groups_normalized,
                proxies_routed = report.proxies_routed,
                "routing enhanced"
            );
        }
        Some(report)
    }

    /// Enhanced copy of `config`; the input is not modified.
    pub fn routed(&self, config: &Value) -> Value {
        let mut copy = config.clone();
        self.apply(&mut copy);
        copy
    }
}

/// Enhance `config` with the built-in profile and hand it back. Values that
/// are not mappings come back unchanged.
pub fn apply_routing(config: Value) -> Value {
    match Enhancer::builtin() {
        Some(enhancer) => apply_routing_with(enhancer, config),
        None => config,
    }
}

pub fn apply_routing_with(enhancer: &Enhancer, mut config: Value) -> Value {
    enhancer.apply(&mut config);
    config
}

/// Section `key` of the root mapping, created with `empty()` when absent or
/// null.
fn section<'a>(
    root: &'a mut Map<String, Value>,
    key: &str,
    empty: fn() -> Value,
) -> &'a mut Value {
    let slot = root.entry(key).or_insert(Value::Null);
    if slot.is_null() {
        *slot = empty();
    }
    slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{
        GROUP_JP_US_KR, GROUP_SG_HK_TW, PROVIDER_JP_US_KR, PROVIDER_SG_HK_TW,
    };
    use serde_json::json;

    fn builtin() -> &'static Enhancer {
        Enhancer::builtin().unwrap()
    }

    #[test]
    fn non_mappings_pass_through() {
        for value in [json!(null), json!(7), json!("config"), json!(true), json!([1, 2])] {
            let mut copy = value.clone();
            assert_eq!(builtin().apply(&mut copy), None);
            assert_eq!(copy, value);
            assert_eq!(apply_routing(value.clone()), value);
        }
    }

    #[test]
    fn empty_config_gets_providers_and_groups() {
        let config = apply_routing(json!({}));
        let providers = config["proxy-providers"].as_object().unwrap();
        assert_eq!(providers.len(), 2);
        assert!(providers.contains_key(PROVIDER_SG_HK_TW));
        assert!(providers.contains_key(PROVIDER_JP_US_KR));

        let groups = config["proxy-groups"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["name"], GROUP_JP_US_KR);
        assert_eq!(groups[1]["name"], GROUP_SG_HK_TW);
        assert!(groups.iter().all(|g| g["type"] == "select"));
        assert!(config.get("proxies").is_none());
    }

    #[test]
    fn report_counts_changes() {
        let mut config = json!({
            "proxy-groups": [{ "name": GROUP_SG_HK_TW, "type": "relay", "use": ["other"] }],
            "proxies": [
                { "name": "HK-01" },
                { "name": "JP-Tokyo" },
                { "name": "DE-Frankfurt" }
            ]
        });
        let report = builtin().apply(&mut config).unwrap();
        assert_eq!(
            report,
            EnhanceReport {
                providers_added: 2,
                groups_created: 1,
                groups_normalized: 1,
                proxies_routed: 2,
            }
        );
        assert_eq!(report.total(), 6);

        let again = builtin().apply(&mut config).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn null_proxies_is_not_an_error() {
        let mut config = json!({ "proxies": null });
        let report = builtin().apply(&mut config).unwrap();
        assert_eq!(report.proxies_routed, 0);
        assert_eq!(config["proxies"], Value::Null);
    }

    #[test]
    fn non_sequence_proxies_are_left_alone() {
        for proxies in [json!({ "name": "HK-01" }), json!("HK-01")] {
            let mut config = json!({ "proxies": proxies.clone() });
            let report = builtin().apply(&mut config).unwrap();
            assert_eq!(report.proxies_routed, 0);
            assert_eq!(report.providers_added, 2);
            assert_eq!(config["proxies"], proxies);
        }
    }

    #[test]
    fn routed_leaves_input_untouched() {
        let config = json!({ "proxies": [{ "name": "香港 01" }] });
        let out = builtin().routed(&config);
        assert!(config.get("proxy-providers").is_none());
        assert_eq!(out["proxies"][0]["dialer-proxy"], GROUP_SG_HK_TW);
    }

    #[test]
    fn section_replaces_null_only() {
        let mut root = json!({ "a": null, "b": 1 }).as_object().unwrap().clone();
        assert_eq!(*section(&mut root, "a", || json!([])), json!([]));
        assert_eq!(*section(&mut root, "b", || json!([])), json!(1));
        assert_eq!(*section(&mut root, "c", || json!({})), json!({}));
    }
}
