//! # toolgate-foundation
//!
//! Foundation layer for Toolgate:
//! - Config: 통합 설정 (ToolgateConfig, GatewayConnection)
//! - Security: 외부 요청 URL 검증 (SSRF 방어)
//! - Storage: JsonStore (글로벌/프로젝트 설정 파일)
//! - Metrics: MetricsSink (카운터/지연시간)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Layer4-cli  (toolgate 바이너리)             │
//! │        │                                    │
//! │        ▼                                    │
//! │  Layer3-router  (선택 엔진, 피드백)           │
//! │        │                                    │
//! │        ▼                                    │
//! │  Layer2-gateway (JSON-RPC, 재시도, 리다이렉트) │
//! │        │                                    │
//! │        ▼                                    │
//! │  Layer1-foundation (설정, 검증, 메트릭)        │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod security;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{AiSettings, GatewayConnection, GatewaySettings, SelectionSettings, ToolgateConfig};

// ============================================================================
// Security
// ============================================================================
pub use security::{blocked_range, validate_parsed, validate_url, BlockedRange, UrlRejection, VettedUrl};

// ============================================================================
// Storage
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Metrics
// ============================================================================
pub use metrics::{InMemoryMetrics, MetricsSink, MetricsSnapshot, NoopMetrics, Observation};
