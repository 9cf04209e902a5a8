//! RankingEngine: severity order for the priority-action list.
//!
//! Primary key is `actual_gap_percent` descending so that components capped
//! at 100% still rank by their true deficit. Ties break on `component_name`
//! ascending, then `component_id` ascending, which makes the order total.

use std::cmp::Ordering;

use crate::types::{ComponentGapResult, PerformanceStatus};

/// Total severity order: most severe first.
///
/// Uses `f64::total_cmp`, so the order is identical across runs and across
/// any permutation of the input.
pub fn severity_order(a: &ComponentGapResult, b: &ComponentGapResult) -> Ordering {
    b.actual_gap_percent
        .total_cmp(&a.actual_gap_percent)
        .then_with(|| a.component_name.cmp(&b.component_name))
        .then_with(|| a.component_id.cmp(&b.component_id))
}

/// Orders components for the priority-action list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Ranked component ids, most severe first.
    ///
    /// Components above their benchmark are left out of the action list;
    /// they remain in the full result set.
    pub fn rank(&self, results: &[ComponentGapResult]) -> Vec<String> {
        self.rank_results(results)
            .into_iter()
            .map(|r| r.component_id.clone())
            .collect()
    }

    /// Same as [`rank`](Self::rank) but borrowing the results themselves.
    pub fn rank_results<'a>(&self, results: &'a [ComponentGapResult]) -> Vec<&'a ComponentGapResult> {
        let mut ranked: Vec<&ComponentGapResult> = results
            .iter()
            .filter(|r| r.performance_status != PerformanceStatus::AboveBenchmark)
            .collect();

        ranked.sort_by(|a, b| severity_order(a, b));
        ranked
    }
}
