//! Property tests for the gap invariants.

use perfgap_core::{
    analyze, AnalysisOptions, ComponentMetric, Direction, GapCalculator, PerformanceStatus,
    RankingEngine, SummaryAggregator,
};
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::HigherIsBetter), Just(Direction::LowerIsBetter)]
}

fn metric() -> impl Strategy<Value = ComponentMetric> {
    (0.01f64..1.0e7, 0.01f64..1.0e7, direction(), 0u32..1000).prop_map(
        |(observed, benchmark, direction, n)| {
            ComponentMetric::new(
                format!("c{}", n),
                format!("Component {}", n % 7),
                observed,
                benchmark,
                direction,
            )
        },
    )
}

fn batch() -> impl Strategy<Value = Vec<ComponentMetric>> {
    prop::collection::vec(metric(), 1..24).prop_map(|metrics| {
        // Unique ids, names may collide to exercise tie-breaks
        metrics
            .into_iter()
            .enumerate()
            .map(|(i, mut m)| {
                m.component_id = format!("c{:03}", i);
                m
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn gap_is_bounded(m in metric()) {
        let r = GapCalculator::new().compute(&m).unwrap();
        prop_assert!((0.0..=100.0).contains(&r.gap_percent));
        prop_assert!((0.0..=1.0).contains(&r.normalized_gap));
    }

    #[test]
    fn zero_gap_iff_not_below(m in metric()) {
        let r = GapCalculator::new().compute(&m).unwrap();
        prop_assert_eq!(r.gap_percent == 0.0, r.performance_status != PerformanceStatus::BelowBenchmark);
    }

    #[test]
    fn capped_iff_actual_over_hundred(m in metric()) {
        let r = GapCalculator::new().compute(&m).unwrap();
        prop_assert_eq!(r.is_capped, r.actual_gap_percent > 100.0);
        if r.performance_status == PerformanceStatus::BelowBenchmark {
            prop_assert_eq!(r.gap_percent, r.actual_gap_percent.min(100.0));
        }
    }

    #[test]
    fn average_uses_capped_values(metrics in batch()) {
        let results = GapCalculator::new().compute_all(&metrics).unwrap();
        let summary = SummaryAggregator::new().summarize(&results).unwrap();

        let capped_mean = results.iter().map(|r| r.gap_percent).sum::<f64>() / results.len() as f64;
        prop_assert!((summary.average_gap_percent - capped_mean).abs() < 1e-9);
        prop_assert!(summary.average_gap_percent <= 100.0);
    }

    #[test]
    fn worst_performer_has_max_actual_gap(metrics in batch()) {
        let results = GapCalculator::new().compute_all(&metrics).unwrap();
        let summary = SummaryAggregator::new().summarize(&results).unwrap();

        let max_actual = results
            .iter()
            .map(|r| r.actual_gap_percent)
            .fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(summary.worst_actual_gap_percent, max_actual);
    }

    #[test]
    fn ranking_is_sorted_and_permutation_stable(metrics in batch()) {
        let results = GapCalculator::new().compute_all(&metrics).unwrap();
        let engine = RankingEngine::new();
        let ranked = engine.rank_results(&results);

        for pair in ranked.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(
                a.actual_gap_percent > b.actual_gap_percent
                    || (a.actual_gap_percent == b.actual_gap_percent
                        && (a.component_name.as_str(), a.component_id.as_str())
                            < (b.component_name.as_str(), b.component_id.as_str()))
            );
        }

        let mut reversed = results.clone();
        reversed.reverse();
        prop_assert_eq!(engine.rank(&reversed), engine.rank(&results));
    }

    #[test]
    fn report_is_order_independent(metrics in batch()) {
        let options = AnalysisOptions::default();
        let forward = analyze(&metrics, &options).unwrap();

        let mut reversed = metrics.clone();
        reversed.reverse();
        let backward = analyze(&reversed, &options).unwrap();

        prop_assert_eq!(
            forward.summary.average_gap_percent.to_bits(),
            backward.summary.average_gap_percent.to_bits()
        );
        prop_assert_eq!(forward, backward);
        prop_assert!(analyze(&metrics, &options).unwrap().mathematical_context.validated);
    }
}
