use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::debug;

use crate::common::EnhanceError;
use crate::config::RouteRuleProfile;

const DIALER_PROXY: &str = "dialer-proxy";

/// One name pattern and the group that matching proxies dial through.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pattern: Regex,
    group: String,
}

impl RouteRule {
    pub fn new(pattern: &str, group: &str) -> Result<Self, EnhanceError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| EnhanceError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: compiled,
            group: group.to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

/// Ordered rule list; the first rule whose pattern matches a proxy name
/// decides its `dialer-proxy`.
#[derive(Debug, Clone, Default)]
pub struct ProxyRouter {
    rules: Vec<RouteRule>,
}

impl ProxyRouter {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn compile(rules: &[RouteRuleProfile]) -> Result<Self, EnhanceError> {
        let rules = rules
            .iter()
            .map(|r| RouteRule::new(&r.pattern, &r.group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Group for a proxy name, if any rule matches.
    pub fn classify(&self, name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(name))
            .map(RouteRule::group)
    }

    /// Set `dialer-proxy` on every matching proxy. Entries that are not
    /// objects, or whose `name` is not a string, are skipped. Returns the
    /// number of proxies whose `dialer-proxy` changed.
    pub fn route(&self, proxies: &mut [Value]) -> usize {
        let mut routed = 0;
        for proxy in proxies.iter_mut() {
            let Some(entry) = proxy.as_object_mut() else {
                continue;
            };
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            let Some(group) = self.classify(name) else {
                continue;
            };
            if entry.get(DIALER_PROXY).and_then(Value::as_str) == Some(group) {
                continue;
            }
            debug!(proxy = name, group, "proxy routed");
            entry.insert(DIALER_PROXY.to_string(), Value::from(group));
            routed += 1;
        }
        routed
    }
}
