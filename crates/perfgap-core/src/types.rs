//! Core types for performance gap analysis.
//!
//! These are the data structures that flow through the pipeline: input
//! metrics, per-component gap results, the aggregate summary, and the
//! report handed to the display layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Which side of the benchmark is desirable for a component.
///
/// Always explicit on every input record. There is no default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Exceeding the benchmark is desirable (yields, coverage, capacity).
    HigherIsBetter,

    /// Staying under the benchmark is desirable (costs, losses, emissions).
    LowerIsBetter,
}

impl Direction {
    /// Wire name used in snapshots and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::HigherIsBetter => "higher_is_better",
            Direction::LowerIsBetter => "lower_is_better",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Accepts `higher_is_better` / `lower_is_better` in any case, with
    /// hyphens or spaces in place of underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "higher_is_better" | "higherisbetter" => Ok(Direction::HigherIsBetter),
            "lower_is_better" | "lowerisbetter" => Ok(Direction::LowerIsBetter),
            _ => Err(format!(
                "unknown direction '{}' (expected higher_is_better or lower_is_better)",
                s
            )),
        }
    }
}

/// Observed-vs-benchmark measurement for one food-system component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentMetric {
    /// Stable identifier
    pub component_id: String,

    /// Display label
    pub component_name: String,

    /// Measured performance
    pub observed_value: f64,

    /// Target performance
    pub benchmark_value: f64,

    /// Preferred direction relative to the benchmark
    pub direction: Direction,
}

impl ComponentMetric {
    pub fn new(
        component_id: impl Into<String>,
        component_name: impl Into<String>,
        observed_value: f64,
        benchmark_value: f64,
        direction: Direction,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            component_name: component_name.into(),
            observed_value,
            benchmark_value,
            direction,
        }
    }
}

/// Severity tier derived from the capped gap.
///
/// Declared in ascending severity so `Ord` follows urgency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Resilient,
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    /// Every tier, least severe first.
    pub const ALL: [PriorityLevel; 5] = [
        PriorityLevel::Resilient,
        PriorityLevel::Low,
        PriorityLevel::Medium,
        PriorityLevel::High,
        PriorityLevel::Critical,
    ];

    /// Human-readable tier name.
    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::Resilient => "Resilient",
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
            PriorityLevel::Critical => "Critical",
        }
    }

    /// High and Critical components need action in the current planning cycle.
    pub fn requires_immediate_attention(&self) -> bool {
        matches!(self, PriorityLevel::High | PriorityLevel::Critical)
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position relative to the benchmark in the preferred direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    AboveBenchmark,
    AtBenchmark,
    BelowBenchmark,
}

impl PerformanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PerformanceStatus::AboveBenchmark => "above benchmark",
            PerformanceStatus::AtBenchmark => "at benchmark",
            PerformanceStatus::BelowBenchmark => "below benchmark",
        }
    }
}

/// Gap figures for one component.
///
/// Produced once by the calculator and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentGapResult {
    pub component_id: String,

    pub component_name: String,

    /// Input observed value, kept for traceability
    pub observed_value: f64,

    /// Input benchmark value, kept for traceability
    pub benchmark_value: f64,

    pub direction: Direction,

    /// Underperformance clamped to [0, 100]
    pub gap_percent: f64,

    /// Unclamped, sign-preserved deficit. Negative when the component beats
    /// its benchmark.
    pub actual_gap_percent: f64,

    /// `gap_percent / 100`
    pub normalized_gap: f64,

    /// How far the component beats its benchmark, as a percentage of the
    /// benchmark. Zero unless `performance_status` is `AboveBenchmark`;
    /// `None` when the ratio overflows.
    pub over_performance_percent: Option<f64>,

    /// `observed / benchmark * 100`; `None` when the ratio overflows
    pub performance_efficiency: Option<f64>,

    pub priority_level: PriorityLevel,

    pub performance_status: PerformanceStatus,

    /// True iff the true deficit exceeds 100%
    pub is_capped: bool,
}

impl ComponentGapResult {
    /// At or beyond the benchmark in the preferred direction.
    pub fn is_resilient(&self) -> bool {
        self.performance_status != PerformanceStatus::BelowBenchmark
    }
}

/// Aggregate statistics for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub total_components: usize,

    /// Components whose capped gap exceeds the minor-gap threshold
    pub components_with_significant_gaps: usize,

    /// Threshold used for `components_with_significant_gaps`
    pub minor_gap_threshold: f64,

    /// Unweighted mean of the capped gaps
    pub average_gap_percent: f64,

    /// Component with the largest uncapped gap
    pub worst_performer: String,

    /// Display name of `worst_performer`
    pub worst_performer_name: String,

    /// Capped gap of `worst_performer`
    pub largest_gap_percent: f64,

    /// Uncapped gap of `worst_performer`
    pub worst_actual_gap_percent: f64,

    /// Same value as `worst_actual_gap_percent`, exposed under the name the
    /// display layer pairs with `largest_gap_percent`
    pub largest_actual_gap_percent: f64,

    /// Count of components per tier; every tier is present
    pub priority_distribution: BTreeMap<PriorityLevel, usize>,

    /// Ids of capped components, sorted
    #[serde(default)]
    pub capped_components: Vec<String>,

    /// Set whenever any component is capped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_note: Option<String>,
}

/// Narrative for one component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interpretation {
    pub title: String,
    pub description: String,
    pub recommended_action: String,
    pub badge_label: String,
}

/// Per-component entry in the report's `gaps` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapEntry {
    pub component_name: String,
    pub direction: Direction,
    pub gap_percent: f64,
    pub actual_gap_percent: f64,
    pub normalized_gap: f64,
    pub over_performance_percent: Option<f64>,
    pub performance_efficiency: Option<f64>,
    pub priority_level: PriorityLevel,
    pub performance_status: PerformanceStatus,
    pub is_capped: bool,
    pub interpretation: Interpretation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_observed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_benchmark: Option<f64>,
}

/// Formula and method description attached to every report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MathematicalContext {
    /// Formula text per direction
    pub formula: BTreeMap<Direction, String>,

    /// Prose explanation of the calculation
    pub description: String,

    /// Variable name to meaning
    pub variables: BTreeMap<String, String>,

    /// Identifier of the calculation method
    pub calculation_method: String,

    /// True when every result satisfied the gap invariants
    pub validated: bool,
}

/// The analytical report consumed by a display layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapReport {
    /// Per-component gaps keyed by component id
    pub gaps: BTreeMap<String, GapEntry>,

    pub summary: AnalysisSummary,

    /// Ranked component ids for the action list, most severe first
    pub priority_ranking: Vec<String>,

    /// One recommended action per ranked component, same order as
    /// `priority_ranking`
    pub priority_actions: Vec<String>,

    pub mathematical_context: MathematicalContext,
}

/// Tunables for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOptions {
    /// Gaps above this count as significant in the summary
    #[serde(default = "default_minor_gap_threshold")]
    pub minor_gap_threshold: f64,

    /// Emit `debug_observed` / `debug_benchmark` in each gap entry
    #[serde(default)]
    pub include_debug_fields: bool,
}

pub(crate) fn default_minor_gap_threshold() -> f64 {
    5.0
}

pub(crate) fn check_minor_gap_threshold(threshold: f64) -> Result<(), AnalysisError> {
    if threshold.is_finite() && (0.0..=100.0).contains(&threshold) {
        Ok(())
    } else {
        Err(AnalysisError::invalid_option(
            "minor_gap_threshold",
            format!("must be within [0, 100], got {:?}", threshold),
        ))
    }
}

impl AnalysisOptions {
    /// Reject option values no analysis can honor.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_minor_gap_threshold(self.minor_gap_threshold)
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            minor_gap_threshold: default_minor_gap_threshold(),
            include_debug_fields: false,
        }
    }
}
