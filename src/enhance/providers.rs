use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ProviderProfile;

/// Insert every missing provider into `proxy-providers`. Entries already
/// present are left exactly as they are. Returns the number inserted.
pub(crate) fn ensure_providers(
    root: &mut Map<String, Value>,
    providers: &[ProviderProfile],
) -> usize {
    let Some(table) = super::section(root, "proxy-providers", || Value::Object(Map::new()))
        .as_object_mut()
    else {
        debug!("proxy-providers is not a mapping, skipping providers");
        return 0;
    };

    let mut added = 0;
    for provider in providers {
        if table.contains_key(&provider.key) {
            continue;
        }
        table.insert(provider.key.clone(), provider.descriptor());
        debug!(
            provider = provider.key.as_str(),
            url = provider.url().as_str(),
            "provider added"
        );
        added += 1;
    }
    added
}
