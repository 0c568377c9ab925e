//! # Pass/Fail Counters
//!
//! The unit of aggregation for every table. Serialized with the column names
//! the exported index uses: `Totals`, `Fails`, `Success`.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Row counters for a resource group or combination.
///
/// `totals == fails + success` holds as long as the counters are only
/// changed through [`Counts::record()`] and [`Counts::merge()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Rows contributing.
    #[serde(rename = "Totals")]
    pub totals: u64,
    /// Rows with a non-passing verdict.
    #[serde(rename = "Fails")]
    pub fails: u64,
    /// Rows with a passing verdict.
    #[serde(rename = "Success")]
    pub success: u64,
}

impl Counts {
    /// Counters for `success` passing and `fails` failing rows.
    pub fn new(success: u64, fails: u64) -> Self {
        Self {
            totals: success + fails,
            fails,
            success,
        }
    }

    /// Count one row.
    pub fn record(&mut self, passed: bool) {
        self.totals += 1;
        if passed {
            self.success += 1;
        } else {
            self.fails += 1;
        }
    }

    /// Add another set of counters into this one.
    pub fn merge(&mut self, other: &Counts) {
        self.totals += other.totals;
        self.fails += other.fails;
        self.success += other.success;
    }

    /// `fails / totals`, or `None` when nothing was counted.
    pub fn failure_rate(&self) -> Option<f64> {
        if self.totals == 0 {
            None
        } else {
            Some(self.fails as f64 / self.totals as f64)
        }
    }

    /// Failure rate as a percentage.
    pub fn failure_percentage(&self) -> Option<f64> {
        self.failure_rate().map(|rate| rate * 100.0)
    }

    /// Whether `totals == fails + success`.
    pub fn is_consistent(&self) -> bool {
        self.totals == self.fails + self.success
    }
}

impl AddAssign<&Counts> for Counts {
    fn add_assign(&mut self, rhs: &Counts) {
        self.merge(rhs);
    }
}
