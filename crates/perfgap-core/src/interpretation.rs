//! InterpretationGenerator: narrative text and recommended action per component.
//!
//! Template selection is driven by the priority tier, with two special cases:
//! zero-gap components report their over-performance, and capped Critical
//! components state the true deficit next to the capped value.

use crate::calculator::GapCalculator;
use crate::types::{ComponentGapResult, Interpretation, PerformanceStatus, PriorityLevel};

/// Pure mapping from a gap result to its narrative.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretationGenerator;

impl InterpretationGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn interpret(&self, result: &ComponentGapResult) -> Interpretation {
        match result.priority_level {
            PriorityLevel::Resilient => resilient(result),
            PriorityLevel::Low => tiered(
                result,
                "Low Performance Gap",
                "The shortfall is minor and within normal variation.",
                "Monitor performance and maintain current resource levels.",
            ),
            PriorityLevel::Medium => tiered(
                result,
                "Medium Performance Gap",
                "The shortfall is noticeable and should be addressed in the next planning cycle.",
                "Review resource allocation and implement targeted improvements.",
            ),
            PriorityLevel::High => tiered(
                result,
                "High Performance Gap",
                "The shortfall is substantial and weakens system resilience.",
                "Plan resource reallocation and strengthen implementation capacity.",
            ),
            PriorityLevel::Critical if result.is_capped => capped_critical(result),
            PriorityLevel::Critical => tiered(
                result,
                "Critical Performance Gap",
                "The shortfall is severe and exposes the food system to significant vulnerability.",
                "Immediate intervention required: prioritize emergency resource allocation \
                 and comprehensive restructuring.",
            ),
        }
    }

    /// One line for the priority-action list.
    pub fn priority_action(&self, result: &ComponentGapResult) -> String {
        let interpretation = self.interpret(result);
        format!(
            "{} ({:.1}% gap): {}",
            result.component_name, result.actual_gap_percent, interpretation.recommended_action
        )
    }
}

fn resilient(result: &ComponentGapResult) -> Interpretation {
    let description = match result.performance_status {
        PerformanceStatus::AboveBenchmark => match result.over_performance_percent {
            Some(percent) => format!(
                "{} meets or exceeds its benchmark, performing {:.1}% above target.",
                result.component_name, percent
            ),
            None => format!(
                "{} exceeds its benchmark by a margin too large to express as a percentage.",
                result.component_name
            ),
        },
        PerformanceStatus::AtBenchmark | PerformanceStatus::BelowBenchmark => format!(
            "{} meets its benchmark exactly.",
            result.component_name
        ),
    };

    Interpretation {
        title: "Excellent Performance — No Gap".to_string(),
        description,
        recommended_action: "Maintain current approach and document practices as a model \
                             for other components."
            .to_string(),
        badge_label: PriorityLevel::Resilient.label().to_string(),
    }
}

fn tiered(result: &ComponentGapResult, title: &str, severity: &str, action: &str) -> Interpretation {
    Interpretation {
        title: title.to_string(),
        description: format!(
            "{} is performing {:.1}% below its benchmark. {}",
            result.component_name, result.gap_percent, severity
        ),
        recommended_action: action.to_string(),
        badge_label: result.priority_level.label().to_string(),
    }
}

fn capped_critical(result: &ComponentGapResult) -> Interpretation {
    Interpretation {
        title: format!(
            "Critical Performance Gap (Capped at {:.0}%)",
            GapCalculator::MAX_GAP_PERCENT
        ),
        description: format!(
            "{} shows a performance gap of {:.1}%, the maximum displayed value. \
             Actual performance gap: {:.1}% below target.",
            result.component_name, result.gap_percent, result.actual_gap_percent
        ),
        recommended_action: "Immediate intervention required: comprehensive restructuring \
                             and emergency resource allocation."
            .to_string(),
        badge_label: PriorityLevel::Critical.label().to_string(),
    }
}
