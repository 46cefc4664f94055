//! Serving statistics for the prediction API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the prediction endpoints
pub struct ApiMetrics {
    /// Total prediction requests served successfully
    pub predictions_served: AtomicU64,
    /// Total prediction requests that failed during scoring
    pub predictions_failed: AtomicU64,
    /// Predictions by model name
    predictions_by_model: RwLock<HashMap<String, u64>>,
    /// Positive (high risk) labels returned
    pub positive_labels: AtomicU64,
    /// Request handling times (in microseconds)
    handling_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ApiMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            predictions_by_model: RwLock::new(HashMap::new()),
            positive_labels: AtomicU64::new(0),
            handling_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a served prediction
    pub fn record_prediction(
        &self,
        model_name: &str,
        handling_time: Duration,
        probability: f64,
        label: i32,
    ) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if label == 1 {
            self.positive_labels.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut by_model) = self.predictions_by_model.write() {
            *by_model.entry(model_name.to_string()).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.handling_times.write() {
            times.push(handling_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (probability * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a scoring failure
    pub fn record_failure(&self, model_name: &str) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_model) = self.predictions_by_model.write() {
            by_model.entry(model_name.to_string()).or_insert(0);
        }
    }

    /// Get handling time statistics
    pub fn get_handling_stats(&self) -> HandlingStats {
        let times = self.handling_times.read().unwrap();
        if times.is_empty() {
            return HandlingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        HandlingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get probability distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    /// Get prediction counts by model
    pub fn get_predictions_by_model(&self) -> HashMap<String, u64> {
        self.predictions_by_model.read().unwrap().clone()
    }

    /// Log a summary of serving statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.predictions_failed.load(Ordering::Relaxed);
        let positives = self.positive_labels.load(Ordering::Relaxed);
        let positive_rate = if served > 0 {
            (positives as f64 / served as f64) * 100.0
        } else {
            0.0
        };

        let handling = self.get_handling_stats();
        let by_model = self.get_predictions_by_model();
        let score_dist = self.get_score_distribution();

        info!(
            served = served,
            failed = failed,
            positive_rate = format!("{:.1}%", positive_rate),
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Serving summary"
        );
        info!(
            "Handling time (μs): mean={} p50={} p95={} p99={} max={}",
            handling.mean_us, handling.p50_us, handling.p95_us, handling.p99_us, handling.max_us
        );
        for (model, count) in &by_model {
            info!("  {}: {} predictions", model, count);
        }

        let total: u64 = score_dist.iter().sum();
        if total > 0 {
            for (i, &count) in score_dist.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                info!(
                    "  probability {:.1}-{:.1}: {} ({:.1}%)",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct
                );
            }
        }
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request handling time statistics
#[derive(Debug, Default)]
pub struct HandlingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that logs serving summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<ApiMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ApiMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ApiMetrics::new();

        metrics.record_prediction("logistic_regression", Duration::from_micros(100), 0.2, 0);
        metrics.record_prediction("random_forest", Duration::from_micros(200), 0.8, 1);
        metrics.record_failure("random_forest");

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.predictions_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.positive_labels.load(Ordering::Relaxed), 1);

        let by_model = metrics.get_predictions_by_model();
        assert_eq!(by_model.get("logistic_regression"), Some(&1));
        assert_eq!(by_model.get("random_forest"), Some(&1));
    }

    #[test]
    fn test_score_buckets() {
        let metrics = ApiMetrics::new();

        metrics.record_prediction("lr", Duration::from_micros(50), 0.05, 0);
        metrics.record_prediction("lr", Duration::from_micros(50), 0.95, 1);
        metrics.record_prediction("lr", Duration::from_micros(50), 1.0, 1);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[0], 1);
        // 1.0 clamps into the top bucket
        assert_eq!(dist[9], 2);
    }

    #[test]
    fn test_handling_stats() {
        let metrics = ApiMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_prediction("lr", Duration::from_micros(us), 0.3, 0);
        }

        let stats = metrics.get_handling_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
