//! Aggregate statistics over a completed result map.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::unit::{UnitResult, UnitStatus};

/// Aggregate counts for one orchestration run.
///
/// Partial result maps (after an Abort) summarize the same way; absent
/// units simply do not count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `successful / total`, 0.0 for an empty map.
    pub success_rate: f64,
}

/// Reduce a result map into aggregate counts. Pure; no failure modes.
pub fn summarize(results: &BTreeMap<String, UnitResult>) -> ExecutionSummary {
    let total = results.len();
    let mut successful = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for result in results.values() {
        match result.status {
            UnitStatus::Success => successful += 1,
            UnitStatus::Failed => failed += 1,
            UnitStatus::Skipped => skipped += 1,
        }
    }

    let success_rate = if total > 0 {
        successful as f64 / total as f64
    } else {
        0.0
    };

    ExecutionSummary {
        total,
        successful,
        failed,
        skipped,
        success_rate,
    }
}
