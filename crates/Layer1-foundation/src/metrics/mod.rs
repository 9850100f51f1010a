//! Metrics - 카운터/지연시간 수집
//!
//! 라우터와 게이트웨이는 `MetricsSink`만 알고, 실제 백엔드는 주입된다.
//! 기본 구현은 프로세스 메모리에 쌓는 `InMemoryMetrics`.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Metric sink shared across threads.
pub trait MetricsSink: Send + Sync {
    /// 카운터 증가
    fn increment(&self, key: &str);

    /// 지연시간 기록 (밀리초)
    fn observe_ms(&self, key: &str, value: u64);

    fn observe(&self, key: &str, elapsed: Duration) {
        self.observe_ms(key, elapsed.as_millis() as u64);
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _key: &str) {}
    fn observe_ms(&self, _key: &str, _value: u64) {}
}

/// 관측값 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Observation {
    pub count: u64,
    pub total_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Observation {
    fn record(&mut self, value: u64) {
        if self.count == 0 {
            self.min_ms = value;
            self.max_ms = value;
        } else {
            self.min_ms = self.min_ms.min(value);
            self.max_ms = self.max_ms.max(value);
        }
        self.count += 1;
        self.total_ms += value;
    }

    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.count as f64
        }
    }
}

/// Point-in-time copy of an [`InMemoryMetrics`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub observations: HashMap<String, Observation>,
}

impl MetricsSnapshot {
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: RwLock<HashMap<String, u64>>,
    observations: RwLock<HashMap<String, Observation>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.read().get(key).copied().unwrap_or(0)
    }

    pub fn observation(&self, key: &str) -> Option<Observation> {
        self.observations.read().get(key).cloned()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.read().clone(),
            observations: self.observations.read().clone(),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, key: &str) {
        *self.counters.write().entry(key.to_string()).or_insert(0) += 1;
    }

    fn observe_ms(&self, key: &str, value: u64) {
        self.observations
            .write()
            .entry(key.to_string())
            .or_default()
            .record(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counters() {
        let metrics = InMemoryMetrics::new();
        metrics.increment("route.requests");
        metrics.increment("route.requests");
        metrics.increment("tool.success");

        assert_eq!(metrics.counter("route.requests"), 2);
        assert_eq!(metrics.counter("tool.success"), 1);
        assert_eq!(metrics.counter("tool.failure"), 0);
    }

    #[test]
    fn test_observations() {
        let metrics = InMemoryMetrics::new();
        metrics.observe_ms("route.latency_ms", 30);
        metrics.observe_ms("route.latency_ms", 10);
        metrics.observe("ai.latency_ms", Duration::from_millis(7));

        assert_eq!(metrics.observation("ai.latency_ms").unwrap().total_ms, 7);
        let obs = metrics.observation("route.latency_ms").unwrap();
        assert_eq!(obs.count, 2);
        assert_eq!(obs.min_ms, 10);
        assert_eq!(obs.max_ms, 30);
        assert_eq!(obs.avg_ms(), 20.0);
    }

    #[test]
    fn test_shared_across_threads() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment("tool.success");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().counter("tool.success"), 400);
    }
}
