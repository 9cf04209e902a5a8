//! SummaryAggregator: reduces per-component results into run statistics.
//!
//! The average is taken over capped gaps, since the summary reports
//! policy-relevant severity. The worst performer is chosen on the uncapped
//! gap so that several components capped at 100% are still distinguishable.
//!
//! Every statistic is computed over a canonical ordering of the results, so
//! the summary is bit-identical for any permutation of the same input.

use std::collections::BTreeMap;

use crate::calculator::GapCalculator;
use crate::ranking::severity_order;
use crate::types::{
    check_minor_gap_threshold, default_minor_gap_threshold, AnalysisSummary, ComponentGapResult,
    PriorityLevel,
};
use crate::AnalysisError;

/// Builds an [`AnalysisSummary`] from a complete result set.
#[derive(Debug, Clone, Copy)]
pub struct SummaryAggregator {
    minor_gap_threshold: f64,
}

impl SummaryAggregator {
    pub fn new() -> Self {
        Self {
            minor_gap_threshold: default_minor_gap_threshold(),
        }
    }

    /// Use a custom threshold for `components_with_significant_gaps`.
    pub fn with_minor_gap_threshold(minor_gap_threshold: f64) -> Self {
        Self { minor_gap_threshold }
    }

    /// Summarize a result set.
    ///
    /// # Errors
    ///
    /// - `InvalidOption` if the threshold is not a percentage in [0, 100]
    /// - `EmptyInput` if `results` is empty
    pub fn summarize(&self, results: &[ComponentGapResult]) -> Result<AnalysisSummary, AnalysisError> {
        check_minor_gap_threshold(self.minor_gap_threshold)?;

        // Canonical order: summation order must not depend on input order.
        let mut ordered: Vec<&ComponentGapResult> = results.iter().collect();
        ordered.sort_by(|a, b| a.component_id.cmp(&b.component_id).then_with(|| severity_order(a, b)));

        let worst = ordered
            .iter()
            .copied()
            .min_by(|a, b| severity_order(a, b))
            .ok_or(AnalysisError::EmptyInput)?;

        let total_components = ordered.len();
        let gap_sum: f64 = ordered.iter().map(|r| r.gap_percent).sum();
        let average_gap_percent = gap_sum / total_components as f64;

        let components_with_significant_gaps = ordered
            .iter()
            .filter(|r| r.gap_percent > self.minor_gap_threshold)
            .count();

        let mut priority_distribution: BTreeMap<PriorityLevel, usize> =
            PriorityLevel::ALL.iter().map(|level| (*level, 0)).collect();
        for result in &ordered {
            *priority_distribution.entry(result.priority_level).or_insert(0) += 1;
        }

        let capped_components: Vec<String> = ordered
            .iter()
            .filter(|r| r.is_capped)
            .map(|r| r.component_id.clone())
            .collect();

        Ok(AnalysisSummary {
            total_components,
            components_with_significant_gaps,
            minor_gap_threshold: self.minor_gap_threshold,
            average_gap_percent,
            worst_performer: worst.component_id.clone(),
            worst_performer_name: worst.component_name.clone(),
            largest_gap_percent: worst.gap_percent,
            worst_actual_gap_percent: worst.actual_gap_percent,
            largest_actual_gap_percent: worst.actual_gap_percent,
            ranking_note: ranking_note(capped_components.len()),
            priority_distribution,
            capped_components,
        })
    }
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn ranking_note(capped: usize) -> Option<String> {
    if capped == 0 {
        return None;
    }

    let subject = if capped == 1 {
        "1 component has a true gap".to_string()
    } else {
        format!("{} components have true gaps", capped)
    };

    Some(format!(
        "{} above {:.0}%. Displayed gaps of {:.0}% may understate true severity; \
         components are ranked by actual_gap_percent.",
        subject,
        GapCalculator::MAX_GAP_PERCENT,
        GapCalculator::MAX_GAP_PERCENT
    ))
}
