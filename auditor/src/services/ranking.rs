//! Project-wide ranking over the merged cross-region job list.
//!
//! Two independent descending orders are computed over the full merged set
//! (billed scan volume and wall-clock duration), each assigning ranks 1..N
//! by position. The worst set is the union of the two top-K lists,
//! deduplicated by job id. Ties carry no secondary sort key: sorts are
//! stable, so rank order for equal metrics follows the incoming list order.

use crate::models::JobRecord;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-job position in each of the two global orderings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRanks {
    pub cost_rank: Option<usize>,
    pub duration_rank: Option<usize>,
}

/// Output of the ranking pass: the selected worst set plus ranks over the
/// *full* merged list, so a job selected for one metric still reports its
/// rank on the other.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    /// Deduplicated worst set, cost-ranked selections first.
    pub selected: Vec<JobRecord>,
    /// Rank map keyed by job id, covering every merged job.
    pub ranks: HashMap<String, JobRanks>,
}

fn order_desc(jobs: &[JobRecord], metric: impl Fn(&JobRecord) -> f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..jobs.len()).collect();
    // Stable sort: equal metrics keep their incoming relative order
    order.sort_by(|&a, &b| {
        metric(&jobs[b]).partial_cmp(&metric(&jobs[a])).unwrap_or(Ordering::Equal)
    });
    order
}

/// Rank the merged job list and select the project-wide worst set.
///
/// Rank assignment is first-wins per job id: a job id that appears more than
/// once (defended against, should not happen across correctly-partitioned
/// regions) is never re-ranked. Selection unions the cost top-`limit` with
/// the duration top-`limit`; a job present in both lists is kept once, the
/// later record replacing the earlier one in place.
pub fn rank_and_select(jobs: &[JobRecord], limit: usize) -> RankingOutcome {
    let by_cost = order_desc(jobs, |job| job.billed_gb_or_zero());
    let by_duration = order_desc(jobs, |job| job.duration_or_zero() as f64);

    let mut ranks: HashMap<String, JobRanks> = HashMap::new();
    for (position, &idx) in by_cost.iter().enumerate() {
        let entry = ranks.entry(jobs[idx].job_id.clone()).or_default();
        if entry.cost_rank.is_none() {
            entry.cost_rank = Some(position + 1);
        }
    }
    for (position, &idx) in by_duration.iter().enumerate() {
        let entry = ranks.entry(jobs[idx].job_id.clone()).or_default();
        if entry.duration_rank.is_none() {
            entry.duration_rank = Some(position + 1);
        }
    }

    let mut selected: Vec<JobRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for &idx in by_cost.iter().take(limit).chain(by_duration.iter().take(limit)) {
        let job = &jobs[idx];
        match positions.get(&job.job_id) {
            Some(&pos) => selected[pos] = job.clone(),
            None => {
                positions.insert(job.job_id.clone(), selected.len());
                selected.push(job.clone());
            },
        }
    }

    RankingOutcome { selected, ranks }
}
