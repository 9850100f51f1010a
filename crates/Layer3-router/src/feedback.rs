//! Feedback Store
//!
//! 도구 호출 결과를 기록하고 선택 점수에 반영한다.
//!
//! ## 핵심 원리
//! ```text
//! Select → Invoke → Record
//!    ↑                 ↓
//!    └── success rate ←┘
//! ```
//!
//! 성공률은 비슷한 작업(Jaccard 유사도)에 가중된다. 기록이 없으면 0.5.

use crate::keyword::{jaccard, tokenize};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// 기록이 없을 때의 성공률
pub const NEUTRAL_SUCCESS_RATE: f64 = 0.5;

/// 피드백 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub task: String,
    pub tool_name: String,
    pub success: bool,
    #[serde(default)]
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(
        task: impl Into<String>,
        tool_name: impl Into<String>,
        success: bool,
        context: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            tool_name: tool_name.into(),
            success,
            context: context.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn success(task: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::new(task, tool_name, true, "")
    }

    pub fn failure(task: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::new(task, tool_name, false, "")
    }
}

/// 도구별 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToolStats {
    pub total: usize,
    pub successes: usize,
}

impl ToolStats {
    pub fn failures(&self) -> usize {
        self.total - self.successes
    }

    /// Unweighted success ratio; neutral when empty
    pub fn success_ratio(&self) -> f64 {
        if self.total == 0 {
            NEUTRAL_SUCCESS_RATE
        } else {
            self.successes as f64 / self.total as f64
        }
    }
}

/// Append-only, in-memory feedback history
///
/// Shared across concurrent routing requests via `Arc`.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    records: RwLock<Vec<FeedbackRecord>>,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 피드백 기록
    pub fn record(&self, record: FeedbackRecord) {
        self.records.write().push(record);
    }

    /// Similarity-weighted success rate of `tool_name` for tasks like `task`.
    ///
    /// Each past record counts with weight `jaccard(task, record.task)`;
    /// records with zero similarity are ignored.
    pub fn success_rate(&self, tool_name: &str, task: &str) -> f64 {
        let query = tokenize(task);
        let records = self.records.read();

        let (weighted_success, total_weight) = records
            .iter()
            .filter(|r| r.tool_name == tool_name)
            .map(|r| (r.success, jaccard(&query, &tokenize(&r.task))))
            .filter(|(_, weight)| *weight > 0.0)
            .fold((0.0, 0.0), |(s, t), (success, weight)| {
                (if success { s + weight } else { s }, t + weight)
            });

        if total_weight == 0.0 {
            NEUTRAL_SUCCESS_RATE
        } else {
            weighted_success / total_weight
        }
    }

    /// 점수 배율: 0.5 (항상 실패) ~ 1.5 (항상 성공), 기록 없으면 1.0
    pub fn score_factor(&self, tool_name: &str, task: &str) -> f64 {
        0.5 + self.success_rate(tool_name, task)
    }

    pub fn stats(&self, tool_name: &str) -> ToolStats {
        self.records
            .read()
            .iter()
            .filter(|r| r.tool_name == tool_name)
            .fold(ToolStats::default(), |mut stats, r| {
                stats.total += 1;
                if r.success {
                    stats.successes += 1;
                }
                stats
            })
    }

    /// Snapshot of every record for `tool_name`, oldest first
    pub fn records_for(&self, tool_name: &str) -> Vec<FeedbackRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.tool_name == tool_name)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_neutral_without_history() {
        let store = FeedbackStore::new();
        assert_eq!(store.success_rate("search", "find rust crates"), 0.5);
        assert_eq!(store.score_factor("search", "find rust crates"), 1.0);
    }

    #[test]
    fn test_success_rate_for_identical_tasks() {
        let store = FeedbackStore::new();
        store.record(FeedbackRecord::success("weather in Seoul", "weather"));
        store.record(FeedbackRecord::success("weather in Seoul", "weather"));
        store.record(FeedbackRecord::failure("weather in Seoul", "weather"));

        let rate = store.success_rate("weather", "weather in Seoul");
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_tasks_ignored() {
        let store = FeedbackStore::new();
        store.record(FeedbackRecord::failure("translate this paragraph", "weather"));

        // no token overlap with the failed task
        assert_eq!(store.success_rate("weather", "forecast Busan"), 0.5);
    }

    #[test]
    fn test_similarity_weighting() {
        let store = FeedbackStore::new();
        // identical task: weight 1.0
        store.record(FeedbackRecord::success("stock price apple", "quotes"));
        // half overlap {stock, price} / {stock, price, apple, history}: weight 0.5
        store.record(FeedbackRecord::failure("stock price history", "quotes"));

        let rate = store.success_rate("quotes", "stock price apple");
        assert!((rate - 1.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_stats_and_snapshot() {
        let store = FeedbackStore::new();
        assert!(store.is_empty());

        store.record(FeedbackRecord::success("a task", "one"));
        store.record(FeedbackRecord::failure("a task", "one"));
        store.record(FeedbackRecord::success("a task", "two"));

        let stats = store.stats("one");
        assert_eq!(stats, ToolStats { total: 2, successes: 1 });
        assert_eq!(stats.failures(), 1);
        assert_eq!(store.stats("missing").success_ratio(), 0.5);

        assert_eq!(store.records_for("two").len(), 1);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_retained() {
        let store = Arc::new(FeedbackStore::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    for j in 0..25 {
                        store.record(FeedbackRecord::new(
                            format!("task {}", j),
                            format!("tool{}", i % 4),
                            j % 2 == 0,
                            "",
                        ));
                    }
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        assert_eq!(store.len(), 32 * 25);
        assert_eq!(store.stats("tool0").total, 8 * 25);
    }
}
