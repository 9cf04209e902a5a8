//! Report assembly: joins the pipeline stages into a [`GapReport`].

use std::collections::BTreeMap;

use crate::aggregator::SummaryAggregator;
use crate::calculator::GapCalculator;
use crate::interpretation::InterpretationGenerator;
use crate::ranking::RankingEngine;
use crate::types::{
    AnalysisOptions, ComponentGapResult, Direction, GapEntry, GapReport, MathematicalContext,
};
use crate::AnalysisError;

/// Identifier of the calculation method reported in every report.
pub const CALCULATION_METHOD: &str = "directional_relative_gap_v1";

/// Builds the final report from a complete result set.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    options: AnalysisOptions,
    ranking: RankingEngine,
    interpreter: InterpretationGenerator,
}

impl ReportBuilder {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            ranking: RankingEngine::new(),
            interpreter: InterpretationGenerator::new(),
        }
    }

    /// Rank, summarize and interpret `results`.
    ///
    /// # Errors
    ///
    /// - `InvalidOption` if the options are out of range
    /// - `EmptyInput` if `results` is empty
    pub fn build(&self, results: &[ComponentGapResult]) -> Result<GapReport, AnalysisError> {
        self.options.validate()?;

        let ranked = self.ranking.rank_results(results);

        let summary = SummaryAggregator::with_minor_gap_threshold(self.options.minor_gap_threshold)
            .summarize(results)?;

        let priority_ranking = ranked.iter().map(|r| r.component_id.clone()).collect();
        let priority_actions = ranked
            .iter()
            .map(|r| self.interpreter.priority_action(r))
            .collect();

        let gaps: BTreeMap<String, GapEntry> = results
            .iter()
            .map(|r| (r.component_id.clone(), self.entry(r)))
            .collect();

        Ok(GapReport {
            gaps,
            summary,
            priority_ranking,
            priority_actions,
            mathematical_context: mathematical_context(results.iter().all(satisfies_invariants)),
        })
    }

    fn entry(&self, result: &ComponentGapResult) -> GapEntry {
        let (debug_observed, debug_benchmark) = if self.options.include_debug_fields {
            (Some(result.observed_value), Some(result.benchmark_value))
        } else {
            (None, None)
        };

        GapEntry {
            component_name: result.component_name.clone(),
            direction: result.direction,
            gap_percent: result.gap_percent,
            actual_gap_percent: result.actual_gap_percent,
            normalized_gap: result.normalized_gap,
            over_performance_percent: result.over_performance_percent,
            performance_efficiency: result.performance_efficiency,
            priority_level: result.priority_level,
            performance_status: result.performance_status,
            is_capped: result.is_capped,
            interpretation: self.interpreter.interpret(result),
            debug_observed,
            debug_benchmark,
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

/// Checks the relationships every result must satisfy.
pub fn satisfies_invariants(result: &ComponentGapResult) -> bool {
    let in_range = (0.0..=GapCalculator::MAX_GAP_PERCENT).contains(&result.gap_percent);
    let zero_iff_not_below = (result.gap_percent == 0.0) == result.is_resilient();
    let capped_iff_over = result.is_capped == (result.actual_gap_percent > GapCalculator::MAX_GAP_PERCENT);
    let normalized = result.normalized_gap == result.gap_percent / 100.0;
    let clamped = result.is_resilient()
        || result.gap_percent == result.actual_gap_percent.min(GapCalculator::MAX_GAP_PERCENT);

    in_range && zero_iff_not_below && capped_iff_over && normalized && clamped
}

fn mathematical_context(validated: bool) -> MathematicalContext {
    let mut formula = BTreeMap::new();
    formula.insert(
        Direction::HigherIsBetter,
        "gap = (benchmark - observed) / observed * 100 if observed < benchmark, else 0; \
         displayed gap = min(gap, 100)"
            .to_string(),
    );
    formula.insert(
        Direction::LowerIsBetter,
        "gap = (observed - benchmark) / benchmark * 100 if observed > benchmark, else 0; \
         displayed gap = min(gap, 100)"
            .to_string(),
    );

    let variables = [
        ("observed", "Measured performance of the component"),
        ("benchmark", "Target or optimal performance for the component"),
        ("gap_percent", "Underperformance relative to benchmark, clamped to [0, 100]"),
        ("actual_gap_percent", "Unclamped, sign-preserved deficit; may exceed 100 or be negative"),
        ("normalized_gap", "gap_percent / 100, in [0, 1]"),
        ("is_capped", "True when actual_gap_percent exceeds 100"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    MathematicalContext {
        formula,
        description: "A performance gap exists only when a component underperforms its benchmark \
                      in its preferred direction. The gap is the relative shortfall in percent. \
                      Displayed gaps are capped at 100% for classification and averaging, while \
                      ranking and worst-performer selection use the uncapped value."
            .to_string(),
        variables,
        calculation_method: CALCULATION_METHOD.to_string(),
        validated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentMetric, PriorityLevel};

    fn results() -> Vec<ComponentGapResult> {
        let metrics = vec![
            ComponentMetric::new("agri", "Agriculture", 3_103_638.89, 2_212_601.63, Direction::HigherIsBetter),
            ComponentMetric::new("infra", "Infrastructure", 824.42, 1_660.24, Direction::HigherIsBetter),
            ComponentMetric::new("waste", "Post-harvest Loss", 12.0, 10.0, Direction::LowerIsBetter),
        ];
        GapCalculator::new().compute_all(&metrics).unwrap()
    }

    #[test]
    fn test_report_contains_every_component() {
        let report = ReportBuilder::default().build(&results()).unwrap();

        assert_eq!(report.gaps.len(), 3);
        assert_eq!(report.gaps["agri"].priority_level, PriorityLevel::Resilient);
        assert_eq!(report.gaps["waste"].priority_level, PriorityLevel::High);
        assert!(report.gaps["infra"].is_capped);
    }

    #[test]
    fn test_priority_actions_follow_ranking() {
        let report = ReportBuilder::default().build(&results()).unwrap();

        assert_eq!(report.priority_ranking, vec!["infra", "waste"]);
        assert_eq!(report.priority_actions.len(), 2);
        assert!(report.priority_actions[0].starts_with("Infrastructure"));
        assert!(report.priority_actions[1].starts_with("Post-harvest Loss"));
    }

    #[test]
    fn test_debug_fields_are_opt_in() {
        let report = ReportBuilder::default().build(&results()).unwrap();
        assert!(report.gaps["infra"].debug_observed.is_none());

        let options = AnalysisOptions {
            include_debug_fields: true,
            ..AnalysisOptions::default()
        };
        let report = ReportBuilder::new(options).build(&results()).unwrap();
        assert_eq!(report.gaps["infra"].debug_observed, Some(824.42));
        assert_eq!(report.gaps["infra"].debug_benchmark, Some(1_660.24));
    }

    #[test]
    fn test_mathematical_context() {
        let report = ReportBuilder::default().build(&results()).unwrap();
        let ctx = &report.mathematical_context;

        assert!(ctx.validated);
        assert_eq!(ctx.calculation_method, CALCULATION_METHOD);
        assert!(ctx.formula[&Direction::HigherIsBetter].contains("/ observed"));
        assert!(ctx.formula[&Direction::LowerIsBetter].contains("/ benchmark"));
        assert!(ctx.variables.contains_key("actual_gap_percent"));
    }

    #[test]
    fn test_debug_fields_omitted_from_json() {
        let report = ReportBuilder::default().build(&results()).unwrap();
        let json = serde_json::to_string(&report).unwrap();

        assert!(!json.contains("debug_observed"));
        assert!(json.contains("\"higher_is_better\""));
        assert!(json.contains("\"priority_actions\""));
    }

    #[test]
    fn test_tampered_result_fails_invariants() {
        let mut result = results().remove(1);
        assert!(satisfies_invariants(&result));

        result.is_capped = false;
        assert!(!satisfies_invariants(&result));
    }
}
