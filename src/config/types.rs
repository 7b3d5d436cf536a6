use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::EnhanceError;

pub const PROVIDER_SG_HK_TW: &str = "sub-sg-hk-tw";
pub const PROVIDER_JP_US_KR: &str = "sub-jp-us-kr";

pub const GROUP_SG_HK_TW: &str = "深港方向";
pub const GROUP_JP_US_KR: &str = "日美方向";

/// Placeholder host; operators replace these URLs with real subscription
/// endpoints through a profile file.
pub const PLACEHOLDER_URL_BASE: &str = "https://subscription.example.invalid";

// Latin tokens sit in a `(?-u:...)` group so case folding stays ASCII-only:
// `K` (Kelvin sign) must not match `KR`, nor `ſ` (long s) match `US`.
pub const PATTERN_SG_HK_TW: &str = "(?-u:SG|HK|TW)|新加坡|狮城|🇸🇬|香港|🇭🇰|台湾|台灣|🇹🇼";
pub const PATTERN_JP_US_KR: &str =
    "(?-u:JP|US|KR|United States|America)|日本|🇯🇵|美国|美國|🇺🇸|韩国|韓國|🇰🇷";

/// Constants driving one enhancement pass.
///
/// `RoutingProfile::default()` is the built-in profile. A YAML profile only
/// needs the sections it overrides; missing sections fall back to the
/// built-in ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutingProfile {
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderProfile>,
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupProfile>,
    #[serde(default = "default_rules")]
    pub rules: Vec<RouteRuleProfile>,
}

impl Default for RoutingProfile {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            groups: default_groups(),
            rules: default_rules(),
        }
    }
}

impl RoutingProfile {
    pub fn validate(&self) -> Result<(), EnhanceError> {
        let mut keys = HashSet::new();
        for provider in &self.providers {
            if provider.key.is_empty() {
                return Err(EnhanceError::Profile("provider key must not be empty".into()));
            }
            if !keys.insert(provider.key.as_str()) {
                return Err(EnhanceError::Profile(format!(
                    "duplicate provider key '{}'",
                    provider.key
                )));
            }
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            if group.name.is_empty() {
                return Err(EnhanceError::Profile("group name must not be empty".into()));
            }
            if !names.insert(group.name.as_str()) {
                return Err(EnhanceError::Profile(format!(
                    "duplicate group name '{}'",
                    group.name
                )));
            }
            if !keys.contains(group.provider.as_str()) {
                return Err(EnhanceError::Profile(format!(
                    "group '{}' uses unknown provider '{}'",
                    group.name, group.provider
                )));
            }
        }

        for rule in &self.rules {
            if rule.pattern.is_empty() {
                return Err(EnhanceError::Profile(format!(
                    "empty pattern for group '{}'",
                    rule.group
                )));
            }
            if !names.contains(rule.group.as_str()) {
                return Err(EnhanceError::UnknownGroup(rule.group.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderProfile {
    pub key: String,
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,
    /// Subscription URL; the placeholder derived from `key` when unset.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_provider_interval")]
    pub interval: u64,
    #[serde(default)]
    pub health_check: HealthCheckProfile,
    #[serde(rename = "override", default)]
    pub override_: OverrideProfile,
}

impl ProviderProfile {
    /// Placeholder provider keyed by `key`, with the file path derived from it.
    pub fn placeholder(key: &str) -> Self {
        Self {
            key: key.to_string(),
            provider_type: default_provider_type(),
            url: None,
            path: None,
            interval: default_provider_interval(),
            health_check: HealthCheckProfile::default(),
            override_: OverrideProfile::default(),
        }
    }

    pub fn url(&self) -> String {
        self.url.clone().unwrap_or_else(|| {
            format!(
                "{}/{}",
                PLACEHOLDER_URL_BASE,
                self.key.trim_start_matches("sub-")
            )
        })
    }

    pub fn cache_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("./providers/{}.yaml", self.key))
    }

    /// Clash `proxy-providers` entry for this provider.
    pub fn descriptor(&self) -> Value {
        json!({
            "type": self.provider_type,
            "url": self.url(),
            "interval": self.interval,
            "path": self.cache_path(),
            "health-check": {
                "enable": self.health_check.enable,
                "interval": self.health_check.interval,
                "url": self.health_check.url,
            },
            "override": {
                "udp": self.override_.udp,
                "skip-cert-verify": self.override_.skip_cert_verify,
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HealthCheckProfile {
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_health_check_interval")]
    pub interval: u64,
    #[serde(default = "default_health_check_url")]
    pub url: String,
}

impl Default for HealthCheckProfile {
    fn default() -> Self {
        Self {
            enable: true,
            interval: default_health_check_interval(),
            url: default_health_check_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OverrideProfile {
    #[serde(default = "default_true")]
    pub udp: bool,
    #[serde(default = "default_true")]
    pub skip_cert_verify: bool,
}

impl Default for OverrideProfile {
    fn default() -> Self {
        Self {
            udp: true,
            skip_cert_verify: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupProfile {
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRuleProfile {
    pub pattern: String,
    pub group: String,
}

fn default_true() -> bool {
    true
}

fn default_provider_type() -> String {
    "http".to_string()
}

fn default_provider_interval() -> u64 {
    3600
}

fn default_health_check_interval() -> u64 {
    600
}

fn default_health_check_url() -> String {
    "https://www.gstatic.com/generate_204".to_string()
}

fn default_providers() -> Vec<ProviderProfile> {
    vec![
        ProviderProfile::placeholder(PROVIDER_SG_HK_TW),
        ProviderProfile::placeholder(PROVIDER_JP_US_KR),
    ]
}

fn default_groups() -> Vec<GroupProfile> {
    vec![
        GroupProfile {
            name: GROUP_SG_HK_TW.to_string(),
            provider: PROVIDER_SG_HK_TW.to_string(),
        },
        GroupProfile {
            name: GROUP_JP_US_KR.to_string(),
            provider: PROVIDER_JP_US_KR.to_string(),
        },
    ]
}

// 顺序即优先级：前面的规则先匹配
fn default_rules() -> Vec<RouteRuleProfile> {
    vec![
        RouteRuleProfile {
            pattern: PATTERN_SG_HK_TW.to_string(),
            group: GROUP_SG_HK_TW.to_string(),
        },
        RouteRuleProfile {
            pattern: PATTERN_JP_US_KR.to_string(),
            group: GROUP_JP_US_KR.to_string(),
        },
    ]
}
