//! Usage summaries
//!
//! A summary is a flat, sorted map from metric name to an aggregate. Names
//! follow `<type>.<field>[.<variant>]`, with `<type>.total` counting blobs.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

/// Running numeric statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

impl Stats {
    /// Stats of a single observation
    #[inline]
    #[must_use]
    pub fn of(value: f64) -> Self {
        Self {
            sum: value,
            min: value,
            max: value,
            count: 1,
        }
    }

    /// Fold in another set of stats
    pub fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count = self.count.saturating_add(other.count);
    }

    /// Arithmetic mean, if anything was observed
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// One aggregated metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Occurrence count
    Count(u64),
    /// Numeric distribution
    Stats(Stats),
}

impl MetricValue {
    /// The count, if this is a count
    #[inline]
    #[must_use]
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Stats(_) => None,
        }
    }

    /// The stats, if these are stats
    #[inline]
    #[must_use]
    pub fn as_stats(&self) -> Option<&Stats> {
        match self {
            Self::Stats(stats) => Some(stats),
            Self::Count(_) => None,
        }
    }

    fn merge(&mut self, metric: &str, other: &Self) {
        match (self, other) {
            (Self::Count(a), Self::Count(b)) => *a = a.saturating_add(*b),
            (Self::Stats(a), Self::Stats(b)) => a.merge(b),
            _ => tracing::debug!(metric, "skipping merge of mismatched metric shapes"),
        }
    }
}

/// Aggregate usage of one or more blobs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageSummary {
    metrics: BTreeMap<String, MetricValue>,
}

impl UsageSummary {
    /// Create an empty summary
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a count, creating it at zero first
    pub fn increment(&mut self, metric: impl Into<String>, by: u64) {
        self.merge_metric(metric.into(), MetricValue::Count(by));
    }

    /// Record one numeric observation
    pub fn record(&mut self, metric: impl Into<String>, value: f64) {
        self.merge_metric(metric.into(), MetricValue::Stats(Stats::of(value)));
    }

    /// Fold another summary into this one
    pub fn merge(&mut self, other: &Self) {
        for (metric, value) in &other.metrics {
            self.merge_metric(metric.clone(), *value);
        }
    }

    fn merge_metric(&mut self, metric: String, value: MetricValue) {
        match self.metrics.entry(metric) {
            btree_map::Entry::Occupied(mut entry) => {
                let name = entry.key().clone();
                entry.get_mut().merge(&name, &value);
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }

    /// Look up a metric
    #[inline]
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&MetricValue> {
        self.metrics.get(metric)
    }

    /// Count of a metric, zero if absent
    #[must_use]
    pub fn count(&self, metric: &str) -> u64 {
        self.get(metric).and_then(MetricValue::as_count).unwrap_or(0)
    }

    /// Metrics in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Metric names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Number of metrics
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_accumulate() {
        let mut summary = UsageSummary::new();
        summary.increment("options-list.total", 1);
        summary.increment("options-list.total", 2);
        assert_eq!(summary.count("options-list.total"), 3);
        assert_eq!(summary.count("missing"), 0);
    }

    #[test]
    fn stats_track_range() {
        let mut summary = UsageSummary::new();
        summary.record("range-slider.step", 5.0);
        summary.record("range-slider.step", 1.0);
        summary.record("range-slider.step", 3.0);

        let stats = summary.get("range-slider.step").and_then(MetricValue::as_stats).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.min - 1.0).abs() < f64::EPSILON);
        assert!((stats.max - 5.0).abs() < f64::EPSILON);
        assert_eq!(stats.mean(), Some(3.0));
    }

    #[test]
    fn merge_combines_summaries() {
        let mut a = UsageSummary::new();
        a.increment("x.total", 1);
        a.record("x.n", 2.0);
        let mut b = UsageSummary::new();
        b.increment("x.total", 1);
        b.increment("y.total", 1);
        b.record("x.n", 4.0);

        a.merge(&b);

        assert_eq!(a.count("x.total"), 2);
        assert_eq!(a.count("y.total"), 1);
        assert_eq!(a.get("x.n").and_then(MetricValue::as_stats).map(|s| s.count), Some(2));
    }

    #[test]
    fn mismatched_shapes_keep_existing() {
        let mut summary = UsageSummary::new();
        summary.increment("x.n", 1);
        summary.record("x.n", 7.0);
        assert_eq!(summary.get("x.n"), Some(&MetricValue::Count(1)));
    }

    #[test]
    fn merge_saturates_instead_of_overflowing() {
        let mut a: UsageSummary = serde_json::from_value(json!({
            "rule.total": u64::MAX,
            "rule.n": {"sum": 1.0, "min": 1.0, "max": 1.0, "count": u64::MAX}
        }))
        .unwrap();
        let mut b = UsageSummary::new();
        b.increment("rule.total", 1);
        b.record("rule.n", 2.0);

        a.merge(&b);

        assert_eq!(a.count("rule.total"), u64::MAX);
        assert_eq!(a.get("rule.n").and_then(MetricValue::as_stats).map(|s| s.count), Some(u64::MAX));
    }

    #[test]
    fn serializes_as_flat_map() {
        let mut summary = UsageSummary::new();
        summary.increment("time-slider.total", 2);
        summary.record("time-slider.n", 1.0);
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "time-slider.n": {"sum": 1.0, "min": 1.0, "max": 1.0, "count": 1},
                "time-slider.total": 2
            })
        );
    }
}
