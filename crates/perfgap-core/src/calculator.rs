//! GapCalculator: observed-vs-benchmark gap for a single component.
//!
//! Formulas, by preferred direction:
//!
//! ```text
//! higher_is_better:  deficit = (benchmark - observed) / observed * 100
//! lower_is_better:   deficit = (observed - benchmark) / benchmark * 100
//! ```
//!
//! The deficit is kept sign-preserved as `actual_gap_percent`. The reported
//! `gap_percent` is the deficit clamped to [0, 100] when underperforming and
//! zero otherwise. Inputs that would make either formula divide by zero or
//! produce a non-finite value are rejected, never coerced.

use crate::classifier::PriorityClassifier;
use crate::types::{ComponentGapResult, ComponentMetric, Direction, PerformanceStatus};
use crate::AnalysisError;

/// Computes capped and uncapped gaps for one component at a time.
///
/// Stateless: results for different components are independent and may be
/// computed in any order or in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapCalculator {
    classifier: PriorityClassifier,
}

impl GapCalculator {
    /// Largest representable gap. Deficits above this are flagged `is_capped`.
    pub const MAX_GAP_PERCENT: f64 = 100.0;

    pub fn new() -> Self {
        Self {
            classifier: PriorityClassifier::new(),
        }
    }

    /// Compute the gap result for one component.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if either value is non-finite or the benchmark is zero
    /// - `DegenerateInput` if the formula for the component's direction would
    ///   divide by a non-positive level, or the gap itself is not finite
    pub fn compute(&self, metric: &ComponentMetric) -> Result<ComponentGapResult, AnalysisError> {
        validate(metric)?;

        let observed = metric.observed_value;
        let benchmark = metric.benchmark_value;

        let performance_status = status(metric);
        let actual_gap_percent = finite(metric, "gap", raw_deficit(metric))?;

        let gap_percent = match performance_status {
            PerformanceStatus::BelowBenchmark => {
                actual_gap_percent.clamp(0.0, Self::MAX_GAP_PERCENT)
            }
            PerformanceStatus::AtBenchmark | PerformanceStatus::AboveBenchmark => 0.0,
        };

        // Auxiliary ratios never reject a component whose gap is defined.
        let over_performance_percent = match performance_status {
            PerformanceStatus::AboveBenchmark => {
                let surplus = match metric.direction {
                    Direction::HigherIsBetter => observed - benchmark,
                    Direction::LowerIsBetter => benchmark - observed,
                };
                representable(surplus / benchmark.abs() * 100.0)
            }
            PerformanceStatus::AtBenchmark | PerformanceStatus::BelowBenchmark => Some(0.0),
        };

        let performance_efficiency = representable(observed / benchmark * 100.0);

        Ok(ComponentGapResult {
            component_id: metric.component_id.clone(),
            component_name: metric.component_name.clone(),
            observed_value: observed,
            benchmark_value: benchmark,
            direction: metric.direction,
            gap_percent,
            actual_gap_percent,
            normalized_gap: gap_percent / 100.0,
            over_performance_percent,
            performance_efficiency,
            priority_level: self.classifier.classify(gap_percent),
            performance_status,
            is_capped: actual_gap_percent > Self::MAX_GAP_PERCENT,
        })
    }

    /// Compute every component, failing the whole batch on the first error.
    ///
    /// Errors surface in input order, so the same batch always reports the
    /// same offending component.
    pub fn compute_all(
        &self,
        metrics: &[ComponentMetric],
    ) -> Result<Vec<ComponentGapResult>, AnalysisError> {
        metrics.iter().map(|m| self.compute(m)).collect()
    }
}

fn validate(metric: &ComponentMetric) -> Result<(), AnalysisError> {
    if !metric.observed_value.is_finite() {
        return Err(AnalysisError::invalid_input(
            &metric.component_id,
            "observed_value",
            format!("value {:?} is not finite", metric.observed_value),
        ));
    }

    if !metric.benchmark_value.is_finite() {
        return Err(AnalysisError::invalid_input(
            &metric.component_id,
            "benchmark_value",
            format!("value {:?} is not finite", metric.benchmark_value),
        ));
    }

    if metric.benchmark_value == 0.0 {
        return Err(AnalysisError::invalid_input(
            &metric.component_id,
            "benchmark_value",
            "benchmark must be non-zero",
        ));
    }

    match metric.direction {
        Direction::HigherIsBetter if metric.observed_value <= 0.0 => {
            Err(AnalysisError::degenerate_input(
                &metric.component_id,
                format!(
                    "observed value {:?} leaves the higher-is-better gap undefined \
                     (formula divides by the observed level)",
                    metric.observed_value
                ),
            ))
        }
        Direction::LowerIsBetter if metric.benchmark_value < 0.0 => {
            Err(AnalysisError::degenerate_input(
                &metric.component_id,
                format!(
                    "negative benchmark {:?} leaves the lower-is-better gap undefined",
                    metric.benchmark_value
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Sign-preserved deficit: positive when underperforming.
fn raw_deficit(metric: &ComponentMetric) -> f64 {
    let observed = metric.observed_value;
    let benchmark = metric.benchmark_value;

    match metric.direction {
        Direction::HigherIsBetter => (benchmark - observed) / observed * 100.0,
        Direction::LowerIsBetter => (observed - benchmark) / benchmark * 100.0,
    }
}

fn status(metric: &ComponentMetric) -> PerformanceStatus {
    let observed = metric.observed_value;
    let benchmark = metric.benchmark_value;

    if observed == benchmark {
        return PerformanceStatus::AtBenchmark;
    }

    let better = match metric.direction {
        Direction::HigherIsBetter => observed > benchmark,
        Direction::LowerIsBetter => observed < benchmark,
    };

    if better {
        PerformanceStatus::AboveBenchmark
    } else {
        PerformanceStatus::BelowBenchmark
    }
}

fn representable(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn finite(metric: &ComponentMetric, what: &str, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::degenerate_input(
            &metric.component_id,
            format!(
                "{} is not finite (observed {:?}, benchmark {:?})",
                what, metric.observed_value, metric.benchmark_value
            ),
        ))
    }
}
