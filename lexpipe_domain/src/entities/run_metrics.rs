// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RunMetrics`: accumulated counters for one `process-pipeline` run.
//!
//! Distinct from the infrastructure `prometheus` metrics (which are
//! process-wide and sampled continuously): this is a plain domain entity
//! returned to the caller at the end of a run and logged as a summary.

use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use std::time::{ Duration, Instant };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    records_read: u64,
    records_cleaned: u64,
    records_rejected: u64,
    records_embedded: u64,
    records_written: u64,
    oom_halvings: u64,
    cache_hits: u64,
    cache_misses: u64,
    #[serde(skip)]
    start_time: Option<Instant>,
    duration: Option<Duration>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            records_read: 0,
            records_cleaned: 0,
            records_rejected: 0,
            records_embedded: 0,
            records_written: 0,
            oom_halvings: 0,
            cache_hits: 0,
            cache_misses: 0,
            start_time: Some(Instant::now()),
            duration: None,
        }
    }

    pub fn record_read(&mut self, n: u64) {
        self.records_read += n;
    }

    pub fn record_cleaned(&mut self, n: u64) {
        self.records_cleaned += n;
    }

    pub fn record_rejected(&mut self, n: u64) {
        self.records_rejected += n;
    }

    pub fn record_embedded(&mut self, n: u64) {
        self.records_embedded += n;
    }

    pub fn record_written(&mut self, n: u64) {
        self.records_written += n;
    }

    pub fn record_oom_halving(&mut self) {
        self.oom_halvings += 1;
    }

    pub fn record_cache_hit(&mut self, hits: u64, misses: u64) {
        self.cache_hits += hits;
        self.cache_misses += misses;
    }

    pub fn finish(&mut self) {
        if let Some(start) = self.start_time {
            self.duration = Some(start.elapsed());
        }
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn records_rejected(&self) -> u64 {
        self.records_rejected
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64) / (total as f64)
        }
    }

    pub fn throughput_records_per_second(&self) -> f64 {
        match self.duration {
            Some(d) if d.as_secs_f64() > 0.0 => (self.records_written as f64) / d.as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_rate_handles_zero_total() {
        let m = RunMetrics::new();
        assert_eq!(m.cache_hit_rate(), 0.0);
    }

    #[test]
    fn cache_hit_rate_computes_ratio() {
        let mut m = RunMetrics::new();
        m.record_cache_hit(3, 1);
        assert!((m.cache_hit_rate() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn counters_accumulate() {
        let mut m = RunMetrics::new();
        m.record_read(10);
        m.record_rejected(2);
        m.record_written(8);
        assert_eq!(m.records_read(), 10);
        assert_eq!(m.records_rejected(), 2);
        assert_eq!(m.records_written(), 8);
    }
}
