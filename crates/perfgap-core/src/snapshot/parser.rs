//! Snapshot parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::directions::DirectionTable;
use crate::types::{ComponentMetric, Direction};
use crate::AnalysisError;

/// Errors that can occur when loading snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Snapshot rejected: {0}")]
    Invalid(#[from] AnalysisError),
}

/// One component as it appears in a snapshot document.
///
/// Numeric fields are kept as raw values until resolution so that a missing
/// or non-numeric value is reported against its component instead of failing
/// the whole document parse.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SnapshotEntry {
    /// Display label; the component id is used when absent
    #[serde(default)]
    pub component_name: Option<String>,

    #[serde(default)]
    pub observed_value: Option<Value>,

    #[serde(default)]
    pub benchmark_value: Option<Value>,

    /// Explicit direction; takes precedence over `component_type`
    #[serde(default)]
    pub direction: Option<String>,

    /// Looked up in the direction table when `direction` is absent
    #[serde(default)]
    pub component_type: Option<String>,
}

/// An immutable input snapshot: component id to measurement.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Snapshot {
    /// Optional label for the analysed system (country, programme, ...)
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form metadata carried alongside the snapshot
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Components keyed by id (BTreeMap for deterministic iteration)
    #[serde(default)]
    pub components: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    /// Parse a snapshot from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_yaml::from_str(yaml)?;
        Ok(snapshot)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(snapshot)
    }

    /// Parse a snapshot from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a snapshot file, choosing the format by extension (`.json` is
    /// JSON, anything else YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Resolve every entry into a [`ComponentMetric`], in component id order.
    ///
    /// The whole batch is rejected on the first invalid entry.
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if the snapshot has no components
    /// - `InvalidInput` for a blank id, a missing, non-numeric or non-finite
    ///   value, an unparseable direction, or a component whose direction
    ///   cannot be resolved
    pub fn into_metrics(&self, directions: &DirectionTable) -> Result<Vec<ComponentMetric>, AnalysisError> {
        if self.components.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        self.components
            .iter()
            .map(|(id, entry)| resolve_entry(id, entry, directions))
            .collect()
    }
}

fn resolve_entry(
    component_id: &str,
    entry: &SnapshotEntry,
    directions: &DirectionTable,
) -> Result<ComponentMetric, AnalysisError> {
    if component_id.trim().is_empty() {
        return Err(AnalysisError::invalid_input(
            component_id,
            "component_id",
            "component id must not be blank",
        ));
    }

    let observed_value = numeric_field(component_id, "observed_value", entry.observed_value.as_ref())?;
    let benchmark_value = numeric_field(component_id, "benchmark_value", entry.benchmark_value.as_ref())?;
    let direction = resolve_direction(component_id, entry, directions)?;

    let component_name = entry
        .component_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(component_id)
        .to_string();

    Ok(ComponentMetric {
        component_id: component_id.to_string(),
        component_name,
        observed_value,
        benchmark_value,
        direction,
    })
}

fn numeric_field(component_id: &str, field: &str, value: Option<&Value>) -> Result<f64, AnalysisError> {
    let number = match value {
        None | Some(Value::Null) => {
            return Err(AnalysisError::invalid_input(component_id, field, "value is missing"));
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let number = number.ok_or_else(|| {
        AnalysisError::invalid_input(component_id, field, "value is not numeric")
    })?;

    if !number.is_finite() {
        return Err(AnalysisError::invalid_input(
            component_id,
            field,
            format!("value {:?} is not finite", number),
        ));
    }

    Ok(number)
}

fn resolve_direction(
    component_id: &str,
    entry: &SnapshotEntry,
    directions: &DirectionTable,
) -> Result<Direction, AnalysisError> {
    if let Some(raw) = &entry.direction {
        return raw
            .parse::<Direction>()
            .map_err(|e| AnalysisError::invalid_input(component_id, "direction", e));
    }

    match &entry.component_type {
        Some(component_type) => directions.resolve(component_type).ok_or_else(|| {
            AnalysisError::invalid_input(
                component_id,
                "direction",
                format!(
                    "no direction given and component type '{}' has no configured direction",
                    component_type
                ),
            )
        }),
        None => Err(AnalysisError::invalid_input(
            component_id,
            "direction",
            "direction is required (or a component_type with a configured direction)",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn directions() -> DirectionTable {
        let mut table = DirectionTable::default();
        table.insert("agricultural_development", Direction::HigherIsBetter);
        table.insert("infrastructure", Direction::HigherIsBetter);
        table
    }

    const VALID_SNAPSHOT: &str = r#"
name: "Kenya FY2024"
metadata:
  currency: USD
components:
  infrastructure:
    component_name: "Infrastructure"
    observed_value: 824.42
    benchmark_value: 1660.24
    direction: higher_is_better
  agricultural_development:
    component_name: "Agricultural Development"
    observed_value: 3103638.89
    benchmark_value: 2212601.63
    component_type: agricultural_development
  food_loss:
    observed_value: "12.5"
    benchmark_value: 10
    direction: lower_is_better
"#;

    #[test]
    fn test_parse_valid_snapshot() {
        let snapshot = Snapshot::from_yaml(VALID_SNAPSHOT).unwrap();
        assert_eq!(snapshot.name.as_deref(), Some("Kenya FY2024"));
        assert_eq!(snapshot.metadata["currency"], "USD");
        assert_eq!(snapshot.len(), 3);

        let metrics = snapshot.into_metrics(&directions()).unwrap();

        // BTreeMap order
        let ids: Vec<_> = metrics.iter().map(|m| m.component_id.as_str()).collect();
        assert_eq!(ids, vec!["agricultural_development", "food_loss", "infrastructure"]);

        assert_eq!(metrics[0].direction, Direction::HigherIsBetter);
        assert_eq!(metrics[1].component_name, "food_loss");
        assert_eq!(metrics[1].observed_value, 12.5);
        assert_eq!(metrics[1].direction, Direction::LowerIsBetter);
        assert_eq!(metrics[2].benchmark_value, 1660.24);
    }

    #[test]
    fn test_parse_json_snapshot() {
        let json = r#"{
            "components": {
                "nutrition": {
                    "component_name": "Nutrition",
                    "observed_value": 6.0,
                    "benchmark_value": 21.47,
                    "direction": "higher_is_better"
                }
            }
        }"#;

        let metrics = Snapshot::from_json(json)
            .unwrap()
            .into_metrics(&directions())
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].observed_value, 6.0);
    }

    #[test]
    fn test_missing_value_names_component_and_field() {
        let yaml = r#"
components:
  infra:
    benchmark_value: 10
    direction: higher_is_better
"#;
        let err = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.component_id(), Some("infra"));
        assert!(err.to_string().contains("observed_value"));
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let yaml = r#"
components:
  infra:
    observed_value: "n/a"
    benchmark_value: 10
    direction: higher_is_better
"#;
        let err = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("not numeric"));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let yaml = r#"
components:
  infra:
    observed_value: .nan
    benchmark_value: .inf
    direction: higher_is_better
"#;
        let err = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn test_direction_is_never_defaulted() {
        let yaml = r#"
components:
  infra:
    observed_value: 5
    benchmark_value: 10
"#;
        let err = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap_err();
        assert!(err.to_string().contains("direction"));

        let yaml = r#"
components:
  infra:
    observed_value: 5
    benchmark_value: 10
    component_type: space_program
"#;
        let err = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap_err();
        assert!(err.to_string().contains("space_program"));
    }

    #[test]
    fn test_explicit_direction_wins_over_type() {
        let yaml = r#"
components:
  infra:
    observed_value: 5
    benchmark_value: 10
    direction: lower_is_better
    component_type: infrastructure
"#;
        let metrics = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap();
        assert_eq!(metrics[0].direction, Direction::LowerIsBetter);
    }

    #[test]
    fn test_bad_direction_rejected() {
        let yaml = r#"
components:
  infra:
    observed_value: 5
    benchmark_value: 10
    direction: sideways
"#;
        let err = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_metrics(&directions())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::from_yaml("components: {}").unwrap();
        let err = snapshot.into_metrics(&directions()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn test_malformed_yaml() {
        let result = Snapshot::from_yaml("components: [1, 2");
        assert!(matches!(result, Err(SnapshotError::YamlError(_))));
    }
}
