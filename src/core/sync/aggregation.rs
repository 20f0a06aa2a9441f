//! Reconcile per-record results into batch counts

use super::transition::BatchTransition;
use super::types::PointageResult;

/// Batch-level view of a downstream response
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub success_count: u32,
    pub failure_count: u32,
    /// Explains a mismatch between records sent and results received
    pub note: Option<String>,
}

impl Aggregate {
    pub fn into_transition(self, results: Vec<PointageResult>) -> BatchTransition {
        BatchTransition::Complete {
            results,
            success_count: self.success_count,
            failure_count: self.failure_count,
            note: self.note,
        }
    }
}

/// Count successes among `results` for a batch of `total` records.
///
/// Records without a result count as failures, so the two counts always
/// add up to `total`.
pub fn aggregate(total: usize, results: &[PointageResult], markers: &[String]) -> Aggregate {
    let matched = results.iter().filter(|r| r.is_success(markers)).count();
    let success = matched.min(total);

    let note = if results.len() != total {
        Some(format!(
            "downstream returned {} results for {} pointages",
            results.len(),
            total
        ))
    } else {
        None
    };

    Aggregate {
        success_count: success as u32,
        failure_count: (total - success) as u32,
        note,
    }
}

/// Positions of records that did not succeed, when results line up with records
pub fn failed_positions(
    total: usize,
    results: &[PointageResult],
    markers: &[String],
) -> Option<Vec<usize>> {
    if results.len() != total {
        return None;
    }

    Some(
        results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_success(markers))
            .map(|(i, _)| i)
            .collect(),
    )
}
