//! Runtime orchestrator for parallel gap analysis.
//!
//! The orchestrator wraps the core pipeline with:
//! - Parallel fan-out of per-component gap computation via rayon
//! - Deterministic fan-in through the core report builder
//! - The configured policy for degenerate components
//! - A timestamped result for audit trails

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use perfgap_core::{
    analyze_results, AnalysisError, AnalysisFailure, ComponentGapResult, ComponentMetric,
    GapCalculator, GapReport, PriorityLevel, Snapshot, SnapshotError,
};

use crate::config::{ConfigError, DegeneratePolicy, RuntimeConfig};

/// Errors from the runtime orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Analysis rejected: {0}")]
    Analysis(#[from] AnalysisError),
}

impl RuntimeError {
    /// Structured failure when the error is an input rejection.
    pub fn failure(&self) -> Option<AnalysisFailure> {
        match self {
            RuntimeError::Analysis(e) | RuntimeError::Snapshot(SnapshotError::Invalid(e)) => {
                Some(e.to_failure())
            }
            _ => None,
        }
    }
}

/// A component dropped under [`DegeneratePolicy::Exclude`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExcludedComponent {
    pub component_id: String,
    pub failure: AnalysisFailure,
}

/// Result from a runtime analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeResult {
    /// The analytical report
    pub report: GapReport,

    /// Components dropped by the degenerate policy, in component order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedComponent>,

    /// Whether the per-component fan-out ran in parallel
    pub parallel: bool,

    /// When the analysis ran
    pub analyzed_at: DateTime<Utc>,
}

impl RuntimeResult {
    /// True when any analysed component is Critical.
    pub fn has_critical(&self) -> bool {
        self.report
            .gaps
            .values()
            .any(|g| g.priority_level == PriorityLevel::Critical)
    }
}

/// The runtime orchestrator.
///
/// # Architecture
/// - Fan-out: every component's gap is computed independently, in parallel
///   for large batches
/// - Join: ranking, summary and interpretation run once over all results
/// - Holds no mutable state; one orchestrator may serve concurrent callers
pub struct RuntimeOrchestrator {
    config: RuntimeConfig,
    calculator: GapCalculator,
}

impl RuntimeOrchestrator {
    /// Create a new runtime orchestrator.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            calculator: GapCalculator::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Resolve a snapshot against the configured direction table and analyze it.
    pub fn analyze_snapshot(&self, snapshot: &Snapshot) -> Result<RuntimeResult, RuntimeError> {
        let metrics = snapshot.into_metrics(&self.config.directions)?;
        self.analyze(&metrics)
    }

    /// Analyze independent snapshots concurrently.
    ///
    /// Results are returned in input order.
    pub fn analyze_many(&self, snapshots: &[Snapshot]) -> Vec<Result<RuntimeResult, RuntimeError>> {
        snapshots
            .par_iter()
            .map(|snapshot| self.analyze_snapshot(snapshot))
            .collect()
    }

    /// Analyze a batch of metrics.
    ///
    /// # Execution Flow
    /// 1. Fan-out: compute every component's gap
    /// 2. Apply the degenerate policy, in component order
    /// 3. Join: build the report from the surviving results
    pub fn analyze(&self, metrics: &[ComponentMetric]) -> Result<RuntimeResult, RuntimeError> {
        if metrics.is_empty() {
            return Err(AnalysisError::EmptyInput.into());
        }

        let parallel = self.config.use_parallel(metrics.len());
        tracing::debug!(components = metrics.len(), parallel, "Computing component gaps");

        let outcomes = self.compute(metrics, parallel);
        let (results, excluded) = self.apply_policy(outcomes)?;

        if results.is_empty() {
            tracing::warn!(
                excluded = excluded.len(),
                "Every component was excluded; nothing left to analyze"
            );
            return Err(AnalysisError::EmptyInput.into());
        }

        tracing::debug!(results = results.len(), "Building report");
        let report = analyze_results(&results, &self.config.analysis)?;

        let analyzed_at = self.config.determinism.analyzed_at.unwrap_or_else(Utc::now);

        tracing::info!(
            components = report.summary.total_components,
            excluded = excluded.len(),
            significant = report.summary.components_with_significant_gaps,
            worst = %report.summary.worst_performer,
            "Analysis complete"
        );

        Ok(RuntimeResult {
            report,
            excluded,
            parallel,
            analyzed_at,
        })
    }

    /// Per-component fan-out. Output order matches `metrics`.
    fn compute(
        &self,
        metrics: &[ComponentMetric],
        parallel: bool,
    ) -> Vec<Result<ComponentGapResult, AnalysisError>> {
        if parallel {
            metrics.par_iter().map(|m| self.calculator.compute(m)).collect()
        } else {
            metrics.iter().map(|m| self.calculator.compute(m)).collect()
        }
    }

    /// Split outcomes into results and excluded components.
    ///
    /// Invalid input always rejects the batch. Degenerate input rejects it
    /// unless the policy is `Exclude`. The first failure in component order
    /// wins, so parallel and sequential runs report the same error.
    fn apply_policy(
        &self,
        outcomes: Vec<Result<ComponentGapResult, AnalysisError>>,
    ) -> Result<(Vec<ComponentGapResult>, Vec<ExcludedComponent>), AnalysisError> {
        let mut results = Vec::with_capacity(outcomes.len());
        let mut excluded = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(err @ AnalysisError::DegenerateInput { .. })
                    if self.config.degenerate_policy == DegeneratePolicy::Exclude =>
                {
                    let component_id = err.component_id().unwrap_or_default().to_string();
                    tracing::warn!(component = %component_id, error = %err, "Excluding degenerate component");
                    excluded.push(ExcludedComponent {
                        component_id,
                        failure: err.to_failure(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok((results, excluded))
    }
}

impl Default for RuntimeOrchestrator {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfgap_core::{analyze, AnalysisOptions, Direction, ErrorKind};

    fn metric(id: &str, observed: f64, benchmark: f64) -> ComponentMetric {
        ComponentMetric::new(id, id.to_uppercase(), observed, benchmark, Direction::HigherIsBetter)
    }

    fn batch() -> Vec<ComponentMetric> {
        vec![
            metric("agri", 3_103_638.89, 2_212_601.63),
            metric("infra", 824.42, 1_660.24),
            metric("nutrition", 6.0, 21.47),
            metric("governance", 88.0, 100.0),
        ]
    }

    fn fixed_config() -> RuntimeConfig {
        use chrono::TimeZone;

        let mut config = RuntimeConfig::default();
        config.determinism.analyzed_at = Some(Utc.with_ymd_and_hms(2025, 12, 20, 10, 0, 0).unwrap());
        config
    }

    #[test]
    fn test_matches_core_pipeline() {
        let orchestrator = RuntimeOrchestrator::new(fixed_config());
        let result = orchestrator.analyze(&batch()).unwrap();

        let direct = analyze(&batch(), &AnalysisOptions::default()).unwrap();
        assert_eq!(result.report, direct);
        assert!(result.excluded.is_empty());
        assert!(!result.parallel);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let metrics: Vec<ComponentMetric> = (0..200)
            .map(|i| metric(&format!("c{:03}", i), 10.0 + (i % 37) as f64, 40.0))
            .collect();

        let mut sequential = fixed_config();
        sequential.parallel.enabled = false;
        let mut parallel = fixed_config();
        parallel.parallel.min_components = 1;

        let a = RuntimeOrchestrator::new(sequential).analyze(&metrics).unwrap();
        let b = RuntimeOrchestrator::new(parallel).analyze(&metrics).unwrap();

        assert!(!a.parallel);
        assert!(b.parallel);
        assert_eq!(
            serde_json::to_string(&a.report).unwrap(),
            serde_json::to_string(&b.report).unwrap()
        );
    }

    #[test]
    fn test_degenerate_aborts_by_default() {
        let mut metrics = batch();
        metrics.push(metric("zero", 0.0, 10.0));

        let err = RuntimeOrchestrator::new(fixed_config()).analyze(&metrics).unwrap_err();
        let failure = err.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::DegenerateInput);
        assert_eq!(failure.component_id.as_deref(), Some("zero"));
    }

    #[test]
    fn test_degenerate_excluded_when_configured() {
        let mut config = fixed_config();
        config.degenerate_policy = DegeneratePolicy::Exclude;

        let mut metrics = batch();
        metrics.push(metric("zero", 0.0, 10.0));

        let result = RuntimeOrchestrator::new(config).analyze(&metrics).unwrap();
        assert_eq!(result.excluded.len(), 1);
        assert_eq!(result.excluded[0].component_id, "zero");
        assert_eq!(result.report.summary.total_components, 4);
        assert!(!result.report.gaps.contains_key("zero"));
    }

    #[test]
    fn test_overflowing_efficiency_does_not_abort_batch() {
        let mut metrics = batch();
        metrics.push(metric("surplus", 1e300, 1e-10));

        let result = RuntimeOrchestrator::new(fixed_config()).analyze(&metrics).unwrap();
        let surplus = &result.report.gaps["surplus"];

        assert!(result.excluded.is_empty());
        assert_eq!(surplus.gap_percent, 0.0);
        assert_eq!(surplus.performance_efficiency, None);
        assert!(result.report.mathematical_context.validated);
    }

    #[test]
    fn test_invalid_input_rejects_even_when_excluding() {
        let mut config = fixed_config();
        config.degenerate_policy = DegeneratePolicy::Exclude;

        let mut metrics = batch();
        metrics.push(metric("broken", f64::NAN, 10.0));

        let err = RuntimeOrchestrator::new(config).analyze(&metrics).unwrap_err();
        assert_eq!(err.failure().unwrap().kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_all_excluded_is_empty_input() {
        let mut config = fixed_config();
        config.degenerate_policy = DegeneratePolicy::Exclude;

        let metrics = vec![metric("zero", 0.0, 10.0)];
        let err = RuntimeOrchestrator::new(config).analyze(&metrics).unwrap_err();
        assert_eq!(err.failure().unwrap().kind, ErrorKind::EmptyInput);
    }

    #[test]
    fn test_analyzed_at_from_config() {
        let config = fixed_config();
        let expected = config.determinism.analyzed_at;

        let result = RuntimeOrchestrator::new(config).analyze(&batch()).unwrap();
        assert_eq!(Some(result.analyzed_at), expected);
    }

    #[test]
    fn test_has_critical() {
        let result = RuntimeOrchestrator::new(fixed_config()).analyze(&batch()).unwrap();
        assert!(result.has_critical());

        let calm = vec![metric("a", 99.0, 100.0)];
        let result = RuntimeOrchestrator::new(fixed_config()).analyze(&calm).unwrap();
        assert!(!result.has_critical());
    }

    #[test]
    fn test_analyze_many_keeps_order() {
        let good = Snapshot::from_yaml(
            r#"
components:
  infra:
    observed_value: 824.42
    benchmark_value: 1660.24
    direction: higher_is_better
"#,
        )
        .unwrap();
        let empty = Snapshot::default();

        let results = RuntimeOrchestrator::new(fixed_config()).analyze_many(&[good.clone(), empty, good]);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().failure().unwrap().kind, ErrorKind::EmptyInput);
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_snapshot_uses_configured_directions() {
        let yaml = r#"
components:
  food_loss:
    observed_value: 12
    benchmark_value: 10
    component_type: food_loss
"#;
        let snapshot = Snapshot::from_yaml(yaml).unwrap();

        let err = RuntimeOrchestrator::new(fixed_config()).analyze_snapshot(&snapshot).unwrap_err();
        assert_eq!(err.failure().unwrap().kind, ErrorKind::InvalidInput);

        let mut config = fixed_config();
        config.directions.insert("food_loss", Direction::LowerIsBetter);
        let result = RuntimeOrchestrator::new(config).analyze_snapshot(&snapshot).unwrap();
        assert!((result.report.gaps["food_loss"].gap_percent - 20.0).abs() < 1e-9);
    }
}
