//! PriorityClassifier: capped gap to priority tier.
//!
//! | gap_percent        | tier      |
//! |--------------------|-----------|
//! | 0                  | Resilient |
//! | (0, 5]             | Low       |
//! | (5, 15]            | Medium    |
//! | (15, 30]           | High      |
//! | > 30               | Critical  |
//!
//! A capped gap of 100 is an ordinary Critical value here. Capping is
//! reported through `is_capped`, not through a separate tier.

use crate::types::PriorityLevel;

/// Threshold lookup over the capped gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityClassifier;

impl PriorityClassifier {
    /// Upper bound (inclusive) of the Low tier.
    pub const LOW_MAX: f64 = 5.0;

    /// Upper bound (inclusive) of the Medium tier.
    pub const MEDIUM_MAX: f64 = 15.0;

    /// Upper bound (inclusive) of the High tier.
    pub const HIGH_MAX: f64 = 30.0;

    pub fn new() -> Self {
        Self
    }

    /// Map a capped gap percentage to its tier. First match wins, in
    /// ascending order.
    pub fn classify(&self, gap_percent: f64) -> PriorityLevel {
        if gap_percent <= 0.0 {
            PriorityLevel::Resilient
        } else if gap_percent <= Self::LOW_MAX {
            PriorityLevel::Low
        } else if gap_percent <= Self::MEDIUM_MAX {
            PriorityLevel::Medium
        } else if gap_percent <= Self::HIGH_MAX {
            PriorityLevel::High
        } else {
            PriorityLevel::Critical
        }
    }
}
