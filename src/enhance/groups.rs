use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::GroupProfile;

const SELECT: &str = "select";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GroupChanges {
    pub created: usize,
    pub normalized: usize,
}

/// Make sure every group exists as a `select` group drawing from its
/// provider.
///
/// A missing group is prepended, so after a pass over an empty list the
/// last group of the profile sits at index 0. An existing group (first entry
/// with the same `name`) keeps its position and other fields: `type` is
/// forced to `select`, a non-sequence `use` is reset to `[]`, and the
/// provider key is appended to `use` unless already listed.
pub(crate) fn ensure_groups(
    root: &mut Map<String, Value>,
    groups: &[GroupProfile],
) -> GroupChanges {
    let mut changes = GroupChanges::default();
    let Some(list) = super::section(root, "proxy-groups", || Value::Array(Vec::new()))
        .as_array_mut()
    else {
        debug!("proxy-groups is not a sequence, skipping groups");
        return changes;
    };

    for group in groups {
        let position = list
            .iter()
            .position(|g| g.get("name").and_then(Value::as_str) == Some(group.name.as_str()));

        match position {
            Some(i) => {
                let Some(entry) = list[i].as_object_mut() else {
                    continue;
                };
                if normalize_group(entry, &group.provider) {
                    debug!(group = group.name.as_str(), "group normalized");
                    changes.normalized += 1;
                }
            }
            None => {
                list.insert(
                    0,
                    json!({
                        "name": group.name,
                        "type": SELECT,
                        "use": [group.provider],
                    }),
                );
                debug!(
                    group = group.name.as_str(),
                    provider = group.provider.as_str(),
                    "group created"
                );
                changes.created += 1;
            }
        }
    }
    changes
}

fn normalize_group(entry: &mut Map<String, Value>, provider: &str) -> bool {
    let mut changed = false;

    if entry.get("type").and_then(Value::as_str) != Some(SELECT) {
        entry.insert("type".to_string(), Value::from(SELECT));
        changed = true;
    }

    let uses = entry
        .entry("use")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !uses.is_array() {
        *uses = Value::Array(Vec::new());
        changed = true;
    }
    if let Value::Array(uses) = uses {
        if !uses.iter().any(|u| u.as_str() == Some(provider)) {
            uses.push(Value::from(provider));
            changed = true;
        }
    }
    changed
}
