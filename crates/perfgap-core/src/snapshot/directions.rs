//! Component-type to direction lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Direction;

/// Legacy type names and the standard type they map to.
const LEGACY_ALIASES: &[(&str, &str)] = &[("social_assistance", "social_protection_equity")];

/// Explicit mapping from component type to preferred direction.
///
/// Used only when a snapshot entry names a `component_type` and no
/// `direction`. Unknown types resolve to `None`; there is no fallback
/// direction. The table is supplied by the caller and starts empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    from = "BTreeMap<String, Direction>",
    into = "BTreeMap<String, Direction>"
)]
pub struct DirectionTable(BTreeMap<String, Direction>);

impl From<BTreeMap<String, Direction>> for DirectionTable {
    fn from(entries: BTreeMap<String, Direction>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (normalize_component_type(&k), v))
                .collect(),
        )
    }
}

impl From<DirectionTable> for BTreeMap<String, Direction> {
    fn from(table: DirectionTable) -> Self {
        table.0
    }
}

impl DirectionTable {
    /// Add or replace an entry. The key is normalized first.
    pub fn insert(&mut self, component_type: &str, direction: Direction) {
        self.0.insert(normalize_component_type(component_type), direction);
    }

    /// Look up the direction for a component type.
    pub fn resolve(&self, component_type: &str) -> Option<Direction> {
        self.0.get(&normalize_component_type(component_type)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Direction)> for DirectionTable {
    fn from_iter<I: IntoIterator<Item = (String, Direction)>>(iter: I) -> Self {
        iter.into_iter().collect::<BTreeMap<_, _>>().into()
    }
}

/// Canonical form of a component type: trimmed, lower-cased, with spaces
/// and hyphens folded to underscores and legacy names mapped forward.
pub fn normalize_component_type(component_type: &str) -> String {
    let normalized = component_type
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_");

    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == normalized)
        .map(|(_, current)| current.to_string())
        .unwrap_or(normalized)
}
