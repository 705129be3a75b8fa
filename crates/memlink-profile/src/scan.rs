// SPDX-FileCopyrightText: 2026 Memlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic discovery of connection profile records in an arbitrary JSON tree.
//!
//! Host settings keep connection profiles in extension-specific places, so the
//! scanner walks the whole document looking for objects shaped like a profile.
//! The walk uses an explicit stack and stops descending past [`MAX_DEPTH`].

use serde_json::{Map, Value};

/// Nesting ceiling for the scan. The root document is depth 0.
pub const MAX_DEPTH: usize = 12;

/// Keys of which at least one must be present for a record to count as a profile.
pub const PROFILE_SHAPED_KEYS: &[&str] = &[
    "api",
    "provider",
    "apiType",
    "api_type",
    "baseUrl",
    "base_url",
    "apiUrl",
    "api-url",
    "url",
    "endpoint",
    "model",
    "secretId",
    "secret-id",
];

/// Whether an object looks like a connection profile: string `id`, string
/// `name`, and at least one provider-shaped field.
pub fn is_profile_record(map: &Map<String, Value>) -> bool {
    map.get("id").is_some_and(Value::is_string)
        && map.get("name").is_some_and(Value::is_string)
        && PROFILE_SHAPED_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Collect profile-shaped objects in document order.
///
/// A matching record is not searched further; profiles do not nest.
pub fn find_profile_records(root: &Value) -> Vec<&Map<String, Value>> {
    let mut found = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((value, depth)) = stack.pop() {
        let children: Vec<&Value> = match value {
            Value::Object(map) => {
                if is_profile_record(map) {
                    found.push(map);
                    continue;
                }
                map.values().collect()
            }
            Value::Array(items) => items.iter().collect(),
            _ => continue,
        };
        if depth >= MAX_DEPTH {
            continue;
        }
        // Reverse so the first child is visited first.
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }

    found
}
