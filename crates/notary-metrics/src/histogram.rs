//! Histogram for latency tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-bucket histogram; observations above the last bound go to an
/// overflow bucket
pub struct Histogram {
    bounds: Vec<f64>,
    /// One count per bound plus the overflow bucket
    counts: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create histogram with buckets suited to per-batch latencies (µs)
    pub fn new() -> Self {
        Self::with_buckets(vec![
            50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 10_000.0, 50_000.0, 250_000.0,
        ])
    }

    /// Create histogram with custom ascending bucket bounds
    pub fn with_buckets(bounds: Vec<f64>) -> Self {
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Histogram {
            bounds,
            counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a value
    pub fn observe(&self, value: f64) {
        self.sum.fetch_add(value.max(0.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        let bucket = self
            .bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.bounds.len());
        self.counts[bucket].fetch_add(1, Ordering::Relaxed);
    }

    /// Mean of all observations
    pub fn mean(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.sum.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Total observation count
    pub fn total_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// `(upper bound, count)` per bucket; the overflow bucket has bound `+inf`
    pub fn buckets(&self) -> Vec<(f64, u64)> {
        self.bounds
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .zip(self.counts.iter().map(|c| c.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_placement() {
        let h = Histogram::with_buckets(vec![10.0, 100.0]);
        h.observe(5.0);
        h.observe(10.0);
        h.observe(50.0);
        h.observe(1_000.0);
        let counts: Vec<u64> = h.buckets().into_iter().map(|(_, c)| c).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(h.total_count(), 4);
    }

    #[test]
    fn test_mean() {
        let h = Histogram::new();
        assert_eq!(h.mean(), 0.0);
        h.observe(100.0);
        h.observe(300.0);
        assert_eq!(h.mean(), 200.0);
    }
}
