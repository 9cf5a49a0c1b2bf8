//! Counters shared by every [`GooseUser`](goose::goose::GooseUser) in the load test.
//!
//! Each user records exactly one sample per completed request through a shared
//! [`RunAggregator`]. When the load test ends, [`RunAggregator::finalize_report`] takes
//! a read-only snapshot of the counters and derives the [`Report`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::report::{Report, REPORT_NOTE};
use crate::validator::Verdict;

#[derive(Debug, Default)]
struct RunCounters {
    total_requests: u64,
    ok_with_selections: u64,
    json_parse_failures: u64,
    response_times_ms: Vec<f64>,
}

/// Thread-safe aggregation of per-request results, shared through an
/// [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct RunAggregator {
    target_path: String,
    counters: Mutex<RunCounters>,
}

impl RunAggregator {
    pub fn new(target_path: &str) -> Self {
        RunAggregator {
            target_path: target_path.to_string(),
            counters: Mutex::new(RunCounters::default()),
        }
    }

    /// Record one completed request. Every request increments the total and adds a
    /// response time sample; successes and JSON parse failures are also counted on
    /// their own. A request is never both.
    pub fn record_request(&self, latency_ms: f64, verdict: &Verdict) {
        let mut counters = self.lock();
        counters.total_requests += 1;
        counters.response_times_ms.push(latency_ms);
        if verdict.is_success() {
            counters.ok_with_selections += 1;
        } else if verdict.is_parse_failure() {
            counters.json_parse_failures += 1;
        }
    }

    /// Snapshot the counters into a [`Report`]. Counters are left untouched, so calling
    /// this again without recording more requests returns an identical report.
    pub fn finalize_report(&self) -> Report {
        self.finalize_report_with_threshold(None)
    }

    /// Same as [`finalize_report`](RunAggregator::finalize_report), also checking the
    /// selection rate against `min_selection_rate` when one is set.
    pub fn finalize_report_with_threshold(&self, min_selection_rate: Option<f64>) -> Report {
        let counters = self.lock();

        let selection_rate = if counters.total_requests > 0 {
            counters.ok_with_selections as f64 / counters.total_requests as f64
        } else {
            0.0
        };
        let avg_response_time_ms = if counters.response_times_ms.is_empty() {
            0.0
        } else {
            counters.response_times_ms.iter().sum::<f64>()
                / counters.response_times_ms.len() as f64
        };

        Report {
            target_path: self.target_path.clone(),
            total_requests: counters.total_requests,
            ok_with_selections: counters.ok_with_selections,
            selection_rate,
            selection_rate_percent: round_hundredths(selection_rate * 100.0),
            avg_response_time_ms: round_hundredths(avg_response_time_ms),
            json_parse_failures: counters.json_parse_failures,
            note: REPORT_NOTE.to_string(),
            min_selection_rate,
            thresholds_ok: min_selection_rate.map(|minimum| selection_rate >= minimum),
        }
    }

    // The counters are always left consistent, so a panic in another user while
    // holding the lock doesn't invalidate them.
    fn lock(&self) -> MutexGuard<'_, RunCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Round to two decimal places, ties to even.
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
