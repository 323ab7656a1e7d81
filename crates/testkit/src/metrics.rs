//! Generation metrics exported as JSON for CI runs.
//!
//! Worldtests and the `populate` command fill a [`MetricsReport`] and write it
//! through a [`MetricsSink`] so runs can be compared over time.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Top-level metrics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test or run identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (RFC 3339)
    pub timestamp: String,

    /// World seed the run used
    pub seed: u64,

    /// Overall result
    pub result: TestResult,

    /// Deposit generation metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationMetrics>,

    /// Deposit cache metrics, when a cache was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMetrics>,

    /// Run execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// All validations passed
    Pass,
    /// At least one validation failed
    Fail,
    /// Skipped
    Skip,
}

/// Chunk population throughput and output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetrics {
    /// Chunks populated
    pub chunks_populated: usize,

    /// Chunks that were modified by population
    pub chunks_modified: usize,

    /// Deposits rooted in the populated chunks, by class
    pub deposits_by_class: BTreeMap<String, usize>,

    /// Oil voxels written
    pub voxels_written: usize,

    /// Springs placed
    pub springs_placed: usize,

    /// Average population time per chunk (microseconds)
    pub avg_populate_time_us: f64,

    /// Slowest population (microseconds)
    pub max_populate_time_us: u128,

    /// Total population time (milliseconds)
    pub total_time_ms: f64,

    /// Chunks per second throughput
    pub chunks_per_second: f64,
}

impl GenerationMetrics {
    /// Fill the timing fields from per-chunk durations in microseconds.
    pub fn record_timings(&mut self, timings_us: &[u128]) {
        let total: u128 = timings_us.iter().sum();
        self.max_populate_time_us = timings_us.iter().copied().max().unwrap_or(0);
        self.total_time_ms = total as f64 / 1000.0;
        if !timings_us.is_empty() {
            self.avg_populate_time_us = total as f64 / timings_us.len() as f64;
        }
        if total > 0 {
            self.chunks_per_second = timings_us.len() as f64 / (total as f64 / 1_000_000.0);
        }
    }
}

/// Deposit cache effectiveness.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that derived a deposit
    pub misses: u64,
    /// Share of lookups answered from the cache
    pub hit_rate: f64,
}

impl CacheMetrics {
    /// Metrics from raw counters.
    pub fn from_counts(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Execution metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total duration (seconds)
    pub duration_seconds: f64,

    /// Number of validations passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validations_passed: Option<usize>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with a name and seed
    pub fn new(test_name: impl Into<String>, seed: u64) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                seed,
                result: TestResult::Pass,
                generation: None,
                cache: None,
                test_execution: TestExecutionMetrics {
                    duration_seconds: 0.0,
                    validations_passed: None,
                },
            },
        }
    }

    /// Set result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set generation metrics
    pub fn generation(mut self, metrics: GenerationMetrics) -> Self {
        self.report.generation = Some(metrics);
        self
    }

    /// Set cache metrics
    pub fn cache(mut self, metrics: CacheMetrics) -> Self {
        self.report.cache = Some(metrics);
        self
    }

    /// Set execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Writes metrics reports to a JSON file.
pub struct MetricsSink {
    path: std::path::PathBuf,
}

impl MetricsSink {
    /// Create a sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Write the report as pretty JSON.
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn metrics_report_roundtrip() {
        let mut generation = GenerationMetrics {
            chunks_populated: 4,
            chunks_modified: 1,
            voxels_written: 120,
            springs_placed: 1,
            ..GenerationMetrics::default()
        };
        generation.deposits_by_class.insert("lake".into(), 2);
        generation.record_timings(&[1000, 3000, 2000, 2000]);

        let report = MetricsReportBuilder::new("roundtrip", 42)
            .generation(generation)
            .cache(CacheMetrics::from_counts(3, 1))
            .build();

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: MetricsReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.test_name, "roundtrip");
        assert_eq!(parsed.seed, 42);
        assert_eq!(parsed.result, TestResult::Pass);
        let generation = parsed.generation.expect("generation metrics");
        assert_eq!(generation.deposits_by_class.get("lake"), Some(&2));
        assert_eq!(generation.max_populate_time_us, 3000);
        assert_eq!(generation.avg_populate_time_us, 2000.0);
        assert_eq!(generation.total_time_ms, 8.0);
        assert_eq!(generation.chunks_per_second, 500.0);
        assert_eq!(parsed.cache.map(|c| c.hit_rate), Some(0.75));
    }

    #[test]
    fn empty_timings_leave_rates_at_zero() {
        let mut generation = GenerationMetrics::default();
        generation.record_timings(&[]);
        assert_eq!(generation.avg_populate_time_us, 0.0);
        assert_eq!(generation.chunks_per_second, 0.0);
        assert_eq!(CacheMetrics::from_counts(0, 0).hit_rate, 0.0);
    }

    #[test]
    fn metrics_sink_writes_file() {
        let path = std::env::temp_dir().join(format!(
            "oilgen-metrics-{}.json",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let report = MetricsReportBuilder::new("sink_test", 7)
            .result(TestResult::Skip)
            .build();

        let sink = MetricsSink::create(&path).unwrap();
        sink.write(&report).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"skip\""));
        assert!(!contents.contains("generation"));

        fs::remove_file(&path).ok();
    }
}
