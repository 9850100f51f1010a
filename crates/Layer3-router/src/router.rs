//! Tool Router - 탐색 → 선택 → 인자 생성 → 호출 → 피드백
//!
//! ```text
//! list_tools ─ select ─ build_arguments ─ call_tool ─ record
//!     │           │                           │
//!     ▼           ▼                           ▼
//! Discovery    NoMatch                 "Invocation failed: …"
//!  (Err)      (Ok, 선택 없음)            (Ok, success=false)
//! ```
//!
//! 호출 실패는 에러가 아니라 결과 문자열로 바뀌어 피드백에 항상 기록된다.

use crate::ai::AiProviderConfig;
use crate::arguments::build_arguments;
use crate::feedback::{FeedbackRecord, FeedbackStore};
use crate::selection::{SelectionCandidate, ToolSelector};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use toolgate_foundation::{MetricsSink, NoopMetrics};
use toolgate_gateway::{GatewayClient, GatewayError, InvocationResult, ToolDescriptor};
use tracing::{info, warn};

/// Prefix for gateway failures in an outcome's result text
pub const INVOCATION_FAILED_PREFIX: &str = "Invocation failed: ";

/// Metric keys
pub mod metric {
    pub const ROUTE_REQUESTS: &str = "route.requests";
    pub const ROUTE_NO_MATCH: &str = "route.no_match";
    pub const ROUTE_DISCOVERY_FAILED: &str = "route.discovery_failed";
    pub const TOOL_SUCCESS: &str = "tool.success";
    pub const TOOL_FAILURE: &str = "tool.failure";
    pub const ROUTE_LATENCY_MS: &str = "route.latency_ms";
}

#[derive(Debug, Error)]
pub enum RouteError {
    /// 카탈로그를 가져오지 못함 (빈 카탈로그와 구분)
    #[error("Tool discovery failed: {0}")]
    Discovery(#[source] GatewayError),
}

/// 호출 전 단계까지의 결과 (dry run)
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub candidates: Vec<SelectionCandidate>,
    pub selected: Option<ToolDescriptor>,
    pub arguments: Option<Map<String, Value>>,
}

impl RoutePlan {
    pub fn is_no_match(&self) -> bool {
        self.selected.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteOutcome {
    /// 선택된 도구 이름
    pub selected: Option<String>,
    pub arguments: Option<Map<String, Value>>,
    pub candidates: Vec<SelectionCandidate>,
    /// 결과 텍스트 (성공 결과, "Tool error: …", "Invocation failed: …")
    pub result: Option<String>,
    pub success: bool,
}

impl RouteOutcome {
    pub fn is_no_match(&self) -> bool {
        self.selected.is_none()
    }

    fn no_match(plan: RoutePlan) -> Self {
        Self {
            selected: None,
            arguments: None,
            candidates: plan.candidates,
            result: None,
            success: false,
        }
    }
}

/// End-to-end routing over one gateway
pub struct ToolRouter {
    gateway: GatewayClient,
    selector: ToolSelector,
    feedback: Arc<FeedbackStore>,
    metrics: Arc<dyn MetricsSink>,
}

impl ToolRouter {
    /// The feedback store is attached to `selector` so recorded outcomes
    /// influence later rankings.
    pub fn new(gateway: GatewayClient, selector: ToolSelector, feedback: Arc<FeedbackStore>) -> Self {
        Self {
            gateway,
            selector: selector.with_feedback(Arc::clone(&feedback)),
            feedback,
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    pub fn feedback(&self) -> &Arc<FeedbackStore> {
        &self.feedback
    }

    /// Discover, rank and build arguments without invoking anything.
    pub async fn plan(
        &self,
        task: &str,
        context: &str,
        ai_config: Option<&AiProviderConfig>,
    ) -> Result<RoutePlan, RouteError> {
        let catalog = match self.gateway.list_tools().await {
            Ok(catalog) => catalog,
            Err(e) => {
                self.metrics.increment(metric::ROUTE_DISCOVERY_FAILED);
                warn!("Tool discovery failed ({:?}): {}", e.kind(), e);
                return Err(RouteError::Discovery(e));
            }
        };

        let candidates = self.selector.select(&catalog, task, context, ai_config).await;
        let selected = candidates.first().map(|c| c.tool.clone());
        let arguments = selected.as_ref().map(|tool| build_arguments(tool, task));

        Ok(RoutePlan {
            candidates,
            selected,
            arguments,
        })
    }

    /// Route `task` to the best tool and invoke it.
    pub async fn route(
        &self,
        task: &str,
        context: &str,
        ai_config: Option<&AiProviderConfig>,
    ) -> Result<RouteOutcome, RouteError> {
        let started = Instant::now();
        self.metrics.increment(metric::ROUTE_REQUESTS);

        let outcome = self.route_inner(task, context, ai_config).await;
        self.metrics.observe(metric::ROUTE_LATENCY_MS, started.elapsed());
        outcome
    }

    async fn route_inner(
        &self,
        task: &str,
        context: &str,
        ai_config: Option<&AiProviderConfig>,
    ) -> Result<RouteOutcome, RouteError> {
        let plan = self.plan(task, context, ai_config).await?;

        let Some(tool) = plan.selected.clone() else {
            self.metrics.increment(metric::ROUTE_NO_MATCH);
            info!("No tool matched task: {}", task);
            return Ok(RouteOutcome::no_match(plan));
        };
        let arguments = plan
            .arguments
            .clone()
            .unwrap_or_else(|| build_arguments(&tool, task));

        let (result, success) = match self.gateway.call_tool(&tool.name, arguments.clone()).await {
            Ok(InvocationResult::Success(text)) => (text, true),
            Ok(remote @ InvocationResult::RemoteError(_)) => (remote.into_text(), false),
            Err(e) => {
                warn!("Invoking '{}' failed: {}", tool.name, e);
                (format!("{}{}", INVOCATION_FAILED_PREFIX, e), false)
            }
        };

        self.feedback
            .record(FeedbackRecord::new(task, tool.name.as_str(), success, context));
        self.metrics.increment(if success {
            metric::TOOL_SUCCESS
        } else {
            metric::TOOL_FAILURE
        });
        info!(
            "Routed task to '{}' ({})",
            tool.name,
            if success { "success" } else { "failure" }
        );

        Ok(RouteOutcome {
            selected: Some(tool.name),
            arguments: Some(arguments),
            candidates: plan.candidates,
            result: Some(result),
            success,
        })
    }
}

impl std::fmt::Debug for ToolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRouter")
            .field("gateway", &self.gateway)
            .field("selector", &self.selector)
            .field("feedback_records", &self.feedback.len())
            .finish()
    }
}
