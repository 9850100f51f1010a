//! # toolgate-router
//!
//! Hybrid tool selection and routing:
//! - `keyword`: 토큰 겹침 점수
//! - `ai`: LLM 추천 (요청별 설정)
//! - `selection`: 키워드 + AI + 피드백 혼합 랭킹
//! - `arguments`: 작업 문장 → 도구 입력
//! - `feedback`: 호출 결과 기록 / 유사 작업 성공률
//! - `router`: 탐색 → 선택 → 호출 → 기록

pub mod ai;
pub mod arguments;
pub mod feedback;
pub mod keyword;
pub mod router;
pub mod selection;

pub use ai::{AiError, AiProviderConfig, AiRecommendation, AiRecommender, HttpAiRecommender};
pub use arguments::build_arguments;
pub use feedback::{FeedbackRecord, FeedbackStore, ToolStats};
pub use router::{RouteError, RouteOutcome, RoutePlan, ToolRouter, INVOCATION_FAILED_PREFIX};
pub use selection::{Provenance, SelectionCandidate, ToolSelector};
