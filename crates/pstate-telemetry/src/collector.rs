//! Aggregation across many blobs

use serde::{Deserialize, Serialize};

use crate::summary::UsageSummary;

/// Folds per-blob summaries into one aggregate
#[derive(Debug, Clone, Default)]
pub struct UsageCollector {
    sampled: u64,
    metrics: UsageSummary,
}

/// What a collector has gathered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Number of summaries folded in
    pub sampled: u64,
    /// Aggregated metrics
    pub metrics: UsageSummary,
}

impl UsageCollector {
    /// Create an empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one summary
    pub fn add(&mut self, summary: &UsageSummary) {
        self.sampled = self.sampled.saturating_add(1);
        self.metrics.merge(summary);
    }

    /// Snapshot of the aggregate
    #[must_use]
    pub fn report(&self) -> UsageReport {
        UsageReport {
            sampled: self.sampled,
            metrics: self.metrics.clone(),
        }
    }

    /// Consume into the aggregate
    #[must_use]
    pub fn into_report(self) -> UsageReport {
        UsageReport {
            sampled: self.sampled,
            metrics: self.metrics,
        }
    }
}

impl Extend<UsageSummary> for UsageCollector {
    fn extend<T: IntoIterator<Item = UsageSummary>>(&mut self, iter: T) {
        for summary in iter {
            self.add(&summary);
        }
    }
}

impl FromIterator<UsageSummary> for UsageCollector {
    fn from_iter<T: IntoIterator<Item = UsageSummary>>(iter: T) -> Self {
        let mut collector = Self::new();
        collector.extend(iter);
        collector
    }
}
