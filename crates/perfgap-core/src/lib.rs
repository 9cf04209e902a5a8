//! # perfgap-core
//!
//! Deterministic performance gap engine for food-system vulnerability models.
//!
//! This crate turns observed-vs-benchmark measurements into a ranked,
//! human-interpretable report:
//! - How far below its benchmark is each component?
//! - How severe is that gap?
//! - Which components need action first?
//!
//! ## Pipeline
//!
//! ```text
//! snapshot → GapCalculator → {PriorityClassifier, RankingEngine}
//!          → SummaryAggregator → InterpretationGenerator → GapReport
//! ```
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces the same report, including tie-break order
//! 2. **No silent coercion**: Invalid or degenerate input is rejected, never mapped to a sentinel gap
//! 3. **Two gap fields**: `gap_percent` is capped for classification; `actual_gap_percent` is kept for ranking
//! 4. **Parallel-safe**: Every stage is a pure function with no shared state
//!
//! ## Example
//!
//! ```rust,ignore
//! use perfgap_core::{analyze, AnalysisOptions, Direction, DirectionTable, Snapshot};
//!
//! let mut directions = DirectionTable::default();
//! directions.insert("food_loss", Direction::LowerIsBetter);
//!
//! let snapshot = Snapshot::from_yaml_file("snapshot.yaml")?;
//! let metrics = snapshot.into_metrics(&directions)?;
//! let report = analyze(&metrics, &AnalysisOptions::default())?;
//!
//! println!("Worst performer: {}", report.summary.worst_performer);
//! for action in &report.priority_actions {
//!     println!("- {}", action);
//! }
//! ```

pub mod aggregator;
pub mod calculator;
pub mod classifier;
pub mod interpretation;
pub mod ranking;
pub mod report;
pub mod snapshot;
pub mod types;

// Re-export main types at crate root
pub use aggregator::SummaryAggregator;
pub use calculator::GapCalculator;
pub use classifier::PriorityClassifier;
pub use interpretation::InterpretationGenerator;
pub use ranking::{severity_order, RankingEngine};
pub use report::{ReportBuilder, CALCULATION_METHOD};
pub use snapshot::{DirectionTable, Snapshot, SnapshotEntry, SnapshotError};
pub use types::{
    AnalysisOptions, AnalysisSummary, ComponentGapResult, ComponentMetric, Direction, GapEntry,
    GapReport, Interpretation, MathematicalContext, PerformanceStatus, PriorityLevel,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during analysis.
///
/// All three are deterministic for a given input; retrying without
/// correcting the input yields the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid input for component '{component_id}' ({field}): {message}")]
    InvalidInput {
        component_id: String,
        field: String,
        message: String,
    },

    #[error("Degenerate input for component '{component_id}': {message}")]
    DegenerateInput { component_id: String, message: String },

    #[error("No components supplied: aggregation over an empty batch is undefined")]
    EmptyInput,

    #[error("Invalid analysis option '{option}': {message}")]
    InvalidOption { option: String, message: String },
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    DegenerateInput,
    EmptyInput,
}

/// Structured failure for the external boundary: kind, offending component
/// and message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFailure {
    pub kind: ErrorKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,

    pub message: String,
}

impl AnalysisError {
    pub fn invalid_input(
        component_id: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AnalysisError::InvalidInput {
            component_id: component_id.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn degenerate_input(component_id: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::DegenerateInput {
            component_id: component_id.into(),
            message: message.into(),
        }
    }

    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidInput { .. } | AnalysisError::InvalidOption { .. } => {
                ErrorKind::InvalidInput
            }
            AnalysisError::DegenerateInput { .. } => ErrorKind::DegenerateInput,
            AnalysisError::EmptyInput => ErrorKind::EmptyInput,
        }
    }

    /// The offending component, when the error concerns one.
    pub fn component_id(&self) -> Option<&str> {
        match self {
            AnalysisError::InvalidInput { component_id, .. }
            | AnalysisError::DegenerateInput { component_id, .. } => Some(component_id.as_str()),
            AnalysisError::EmptyInput | AnalysisError::InvalidOption { .. } => None,
        }
    }

    pub fn to_failure(&self) -> AnalysisFailure {
        AnalysisFailure {
            kind: self.kind(),
            component_id: self.component_id().map(str::to_string),
            message: self.to_string(),
        }
    }
}

/// Analyze a batch of component metrics.
///
/// This is the main entry point. It computes every gap, then ranks,
/// summarizes and interprets the full result set.
///
/// # Errors
///
/// The whole batch is rejected, with no partial report, when:
/// - any component has invalid values (`InvalidInput`)
/// - any component is degenerate for its formula (`DegenerateInput`)
/// - `metrics` is empty (`EmptyInput`)
/// - an option is out of range (`InvalidOption`)
pub fn analyze(metrics: &[ComponentMetric], options: &AnalysisOptions) -> Result<GapReport, AnalysisError> {
    options.validate()?;

    if metrics.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let results = GapCalculator::new().compute_all(metrics)?;
    analyze_results(&results, options)
}

/// Build a report from already computed gap results.
///
/// Use this when the per-component fan-out runs elsewhere (for example in
/// parallel); the join stages here are identical to [`analyze`].
pub fn analyze_results(
    results: &[ComponentGapResult],
    options: &AnalysisOptions,
) -> Result<GapReport, AnalysisError> {
    ReportBuilder::new(options.clone()).build(results)
}

/// Resolve a snapshot against a direction table and analyze it.
pub fn analyze_snapshot(
    snapshot: &Snapshot,
    directions: &DirectionTable,
    options: &AnalysisOptions,
) -> Result<GapReport, AnalysisError> {
    let metrics = snapshot.into_metrics(directions)?;
    analyze(&metrics, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_and_components() {
        let err = AnalysisError::invalid_input("infra", "observed_value", "value is missing");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.component_id(), Some("infra"));

        let err = AnalysisError::EmptyInput;
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
        assert_eq!(err.component_id(), None);
    }

    #[test]
    fn test_failure_serialization() {
        let failure = AnalysisError::degenerate_input("nutrition", "observed value 0").to_failure();
        let json = serde_json::to_value(&failure).unwrap();

        assert_eq!(json["kind"], "degenerate_input");
        assert_eq!(json["component_id"], "nutrition");
        assert!(json["message"].as_str().unwrap().contains("nutrition"));

        let empty = serde_json::to_value(AnalysisError::EmptyInput.to_failure()).unwrap();
        assert!(empty.get("component_id").is_none());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = analyze(&[], &AnalysisOptions::default()).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyInput);
    }
}
